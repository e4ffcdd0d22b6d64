use log::{debug, info};

use lockstep_shared::{Command, FrameId, FrameNumber, InitId, ObjectId, ResourceState, StateError};

use super::{
    abort_children, start_children_exit, start_children_init, sync_children_exit,
    sync_children_init, update_children, ChildResource, Resource, ResourceCore, ResourceKind,
};
use crate::session::TaskContext;

/// A resource between the node and the channels: owns the resources of the
/// level below and runs their tasks nested inside its own
pub struct Container<C> {
    core: ResourceCore,
    children: Vec<C>,
}

/// What sets one container level apart from the others
pub(crate) trait Level {
    const KIND: ResourceKind;

    fn create_command(id: ObjectId) -> Command;

    fn destroy_command(id: ObjectId) -> Command;
}

impl<C> Container<C> {
    pub(crate) fn named(name: &str) -> Self
    where
        Self: Level,
    {
        Self {
            core: ResourceCore::new(Self::KIND, name),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: C) {
        self.children.push(child);
    }

    /// Detaches a child. Returns `None` if `index` is out of range.
    pub fn remove_child(&mut self, index: usize) -> Option<C> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    pub fn children(&self) -> &[C] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [C] {
        &mut self.children
    }
}

impl<C> Resource for Container<C> {
    fn core(&self) -> &ResourceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ResourceCore {
        &mut self.core
    }
}

impl<C: ChildResource> ChildResource for Container<C>
where
    Self: Level,
{
    fn create_command(id: ObjectId) -> Command {
        <Self as Level>::create_command(id)
    }

    fn destroy_command(id: ObjectId) -> Command {
        <Self as Level>::destroy_command(id)
    }

    fn try_start_config_init(
        &mut self,
        init_id: InitId,
        ctx: &mut TaskContext,
    ) -> Result<(), StateError> {
        self.core.begin_init()?;
        info!("TASK {} '{}' config init", self.kind(), self.name());
        ctx.send(
            self.id(),
            Command::ConfigInit {
                init_id,
                name: self.name().to_string(),
                instance_data: Vec::new(),
            },
        );
        start_children_init(self.core.id(), &mut self.children, init_id, ctx);
        Ok(())
    }

    fn sync_config_init(&mut self, ctx: &mut TaskContext) -> bool {
        let children = sync_children_init(&self.core, &mut self.children, ctx);
        let state = self.core.wait_init(ctx.session.config().sync_timeout);
        children && state == ResourceState::Running
    }

    fn try_start_config_exit(&mut self, ctx: &mut TaskContext) -> Result<(), StateError> {
        self.core.begin_exit()?;
        start_children_exit(&mut self.children, ctx);
        info!("TASK {} '{}' config exit", self.kind(), self.name());
        ctx.send(self.id(), Command::ConfigExit);
        Ok(())
    }

    fn sync_config_exit(&mut self, ctx: &mut TaskContext) -> bool {
        let success = self.core.wait_exit(ctx.session.config().sync_timeout);
        let children = sync_children_exit(self.core.id(), &mut self.children, ctx);
        success && children
    }

    fn try_update(
        &mut self,
        frame_id: FrameId,
        frame_number: FrameNumber,
        ctx: &mut TaskContext,
    ) -> Result<(), StateError> {
        self.core.check_running("update")?;
        debug!("TASK {} '{}' start frame {}", self.kind(), self.name(), frame_number);
        ctx.send(
            self.id(),
            Command::FrameStart {
                frame_id,
                frame_number,
            },
        );
        update_children(&mut self.children, frame_id, frame_number, ctx)?;
        ctx.send(
            self.id(),
            Command::FrameFinish {
                frame_id,
                frame_number,
            },
        );
        debug!("TASK {} '{}' finish frame {}", self.kind(), self.name(), frame_number);
        Ok(())
    }

    fn abort_pending(&mut self, message: &str) {
        self.core.fail_pending(message);
        abort_children(&mut self.children, message);
    }
}

#[cfg(test)]
mod tests {
    use lockstep_shared::{Command, ResourceKind};

    use crate::resource::{ChildResource, Channel, Pipe, Resource, Window};

    #[test]
    fn each_level_has_its_own_kind_and_commands() {
        let pipe = Pipe::new("gpu0").with_window(Window::new("main"));
        assert_eq!(pipe.kind(), ResourceKind::Pipe);
        assert_eq!(pipe.windows()[0].kind(), ResourceKind::Window);

        assert_eq!(
            <Pipe as ChildResource>::create_command(3),
            Command::CreatePipe { pipe_id: 3 }
        );
        assert_eq!(
            <Window as ChildResource>::destroy_command(4),
            Command::DestroyWindow { window_id: 4 }
        );
    }

    #[test]
    fn removing_a_child_keeps_the_order_of_the_rest() {
        let mut window = Window::new("main")
            .with_channel(Channel::new("left"))
            .with_channel(Channel::new("center"))
            .with_channel(Channel::new("right"));

        assert!(window.remove_child(3).is_none());
        let removed = window.remove_child(1).unwrap();
        assert_eq!(removed.name(), "center");

        let names: Vec<&str> = window.channels().iter().map(|channel| channel.name()).collect();
        assert_eq!(names, vec!["left", "right"]);
    }
}
