use lockstep_shared::{FrameId, FrameNumber, InitId, ObjectId, ResourceKind};

/// The resource a task is addressed to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResourceRef<'a> {
    pub kind: ResourceKind,
    pub id: ObjectId,
    pub name: &'a str,
    /// Id of the containing resource, `None` for the node itself
    pub parent: Option<ObjectId>,
}

/// Application hooks run by a render node for the tasks of its resources.
///
/// Every method has a default that succeeds without doing anything, so a
/// delegate only implements the tasks it cares about. An `Err` from an init
/// or exit task is sent back to the server as the resource's error text.
pub trait NodeDelegate: Send {
    fn config_init(&mut self, _resource: ResourceRef<'_>, _init_id: InitId) -> Result<(), String> {
        Ok(())
    }

    fn config_exit(&mut self, _resource: ResourceRef<'_>) -> Result<(), String> {
        Ok(())
    }

    fn frame_start(
        &mut self,
        _resource: ResourceRef<'_>,
        _frame_id: FrameId,
        _frame_number: FrameNumber,
    ) {
    }

    fn frame_finish(
        &mut self,
        _resource: ResourceRef<'_>,
        _frame_id: FrameId,
        _frame_number: FrameNumber,
    ) {
    }
}

/// Runs every task with the default behavior
#[derive(Debug, Default)]
pub struct NoopDelegate;

impl NodeDelegate for NoopDelegate {}
