mod channel;
mod container;
mod core;
mod node;
mod pipe;
mod window;

pub use channel::Channel;
pub use container::Container;
pub use self::core::{ResourceCore, ResourceShared};
pub use lockstep_shared::ResourceKind;
pub use node::{BarrierHandle, Node};
pub use pipe::Pipe;
pub use window::Window;

use log::{debug, warn};

use lockstep_shared::{
    Command, FrameId, FrameNumber, InitId, ObjectId, ResourceState, StateError, INVALID_ID,
};

use crate::session::TaskContext;

/// Read access shared by every resource of the tree
pub trait Resource {
    fn core(&self) -> &ResourceCore;

    fn core_mut(&mut self) -> &mut ResourceCore;

    /// `INVALID_ID` until the resource is registered with a session
    fn id(&self) -> ObjectId {
        self.core().id()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn kind(&self) -> ResourceKind {
        self.core().kind()
    }

    fn state(&self) -> ResourceState {
        self.core().state()
    }

    fn error(&self) -> String {
        self.core().error()
    }

    fn is_used(&self) -> bool {
        self.core().is_used()
    }

    /// An unused resource is neither initialized nor updated. A resource
    /// that still holds an id is torn down at exit regardless.
    fn set_used(&mut self, used: bool) {
        self.core_mut().set_used(used);
    }
}

/// A resource created on the render node by a command sent to its parent
pub(crate) trait ChildResource: Resource {
    fn create_command(id: ObjectId) -> Command;

    fn destroy_command(id: ObjectId) -> Command;

    fn try_start_config_init(
        &mut self,
        init_id: InitId,
        ctx: &mut TaskContext,
    ) -> Result<(), StateError>;

    fn sync_config_init(&mut self, ctx: &mut TaskContext) -> bool;

    fn try_start_config_exit(&mut self, ctx: &mut TaskContext) -> Result<(), StateError>;

    fn sync_config_exit(&mut self, ctx: &mut TaskContext) -> bool;

    fn try_update(
        &mut self,
        frame_id: FrameId,
        frame_number: FrameNumber,
        ctx: &mut TaskContext,
    ) -> Result<(), StateError>;

    /// Fails this resource and every descendant still waiting for a reply,
    /// for commands that never left the server
    fn abort_pending(&mut self, message: &str);
}

/// Registers and creates every used child, then starts its init. A child
/// that cannot be started stays behind with an error and is reported by
/// the sync.
pub(crate) fn start_children_init<C: ChildResource>(
    parent: ObjectId,
    children: &mut [C],
    init_id: InitId,
    ctx: &mut TaskContext,
) {
    for child in children.iter_mut().filter(|child| child.is_used()) {
        let id = match ctx.session.register_resource(child.core_mut()) {
            Ok(id) => id,
            Err(error) => {
                child.core().fail_init(&error.to_string());
                continue;
            }
        };

        ctx.send(parent, C::create_command(id));
        if let Err(error) = child.try_start_config_init(init_id, ctx) {
            child.core().fail_init(&error.to_string());
        }
    }
}

/// Syncs every used child. Failures are collected into `parent`'s error,
/// siblings of a failed child are still synced.
pub(crate) fn sync_children_init<C: ChildResource>(
    parent: &ResourceCore,
    children: &mut [C],
    ctx: &mut TaskContext,
) -> bool {
    let mut success = true;
    for child in children.iter_mut().filter(|child| child.is_used()) {
        if !child.sync_config_init(ctx) {
            parent.append_child_error(child.kind(), &child.error());
            success = false;
        }
    }
    success
}

pub(crate) fn abort_children<C: ChildResource>(children: &mut [C], message: &str) {
    for child in children.iter_mut() {
        if child.state().is_pending() {
            child.abort_pending(message);
        }
    }
}

pub(crate) fn start_children_exit<C: ChildResource>(children: &mut [C], ctx: &mut TaskContext) {
    for child in children
        .iter_mut()
        .filter(|child| child.state() != ResourceState::Stopped)
    {
        if let Err(error) = child.try_start_config_exit(ctx) {
            warn!("{}", error);
        }
    }
}

/// Syncs, destroys and deregisters every child that holds an id, used or
/// not
pub(crate) fn sync_children_exit<C: ChildResource>(
    parent: ObjectId,
    children: &mut [C],
    ctx: &mut TaskContext,
) -> bool {
    let mut success = true;
    for child in children.iter_mut().filter(|child| child.id() != INVALID_ID) {
        if !child.sync_config_exit(ctx) {
            success = false;
        }
        ctx.send(parent, C::destroy_command(child.id()));
        ctx.session.deregister_resource(child.core_mut());
    }
    success
}

pub(crate) fn update_children<C: ChildResource>(
    children: &mut [C],
    frame_id: FrameId,
    frame_number: FrameNumber,
    ctx: &mut TaskContext,
) -> Result<(), StateError> {
    for child in children.iter_mut().filter(|child| child.is_used()) {
        // made used after the last init, joins frames with the next init
        if child.state() == ResourceState::Stopped {
            debug!("{} '{}' is not initialized, no frame", child.kind(), child.name());
            continue;
        }
        child.try_update(frame_id, frame_number, ctx)?;
    }
    Ok(())
}
