use log::{debug, info};

use lockstep_shared::{Command, FrameId, FrameNumber, InitId, ObjectId, ResourceState, StateError};

use super::{ChildResource, Resource, ResourceCore, ResourceKind};
use crate::session::TaskContext;

/// A rendering viewport of a window, the leaf of the resource tree
pub struct Channel {
    core: ResourceCore,
}

impl Channel {
    pub fn new(name: &str) -> Self {
        Self {
            core: ResourceCore::new(ResourceKind::Channel, name),
        }
    }
}

impl Resource for Channel {
    fn core(&self) -> &ResourceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ResourceCore {
        &mut self.core
    }
}

impl ChildResource for Channel {
    fn create_command(id: ObjectId) -> Command {
        Command::CreateChannel { channel_id: id }
    }

    fn destroy_command(id: ObjectId) -> Command {
        Command::DestroyChannel { channel_id: id }
    }

    fn try_start_config_init(
        &mut self,
        init_id: InitId,
        ctx: &mut TaskContext,
    ) -> Result<(), StateError> {
        self.core.begin_init()?;
        info!("TASK channel '{}' config init", self.name());
        ctx.send(
            self.id(),
            Command::ConfigInit {
                init_id,
                name: self.name().to_string(),
                instance_data: Vec::new(),
            },
        );
        Ok(())
    }

    fn sync_config_init(&mut self, ctx: &mut TaskContext) -> bool {
        self.core.wait_init(ctx.session.config().sync_timeout) == ResourceState::Running
    }

    fn try_start_config_exit(&mut self, ctx: &mut TaskContext) -> Result<(), StateError> {
        self.core.begin_exit()?;
        info!("TASK channel '{}' config exit", self.name());
        ctx.send(self.id(), Command::ConfigExit);
        Ok(())
    }

    fn sync_config_exit(&mut self, ctx: &mut TaskContext) -> bool {
        self.core.wait_exit(ctx.session.config().sync_timeout)
    }

    fn try_update(
        &mut self,
        frame_id: FrameId,
        frame_number: FrameNumber,
        ctx: &mut TaskContext,
    ) -> Result<(), StateError> {
        self.core.check_running("update")?;
        debug!("TASK channel '{}' frame {}", self.name(), frame_number);
        ctx.send(
            self.id(),
            Command::FrameStart {
                frame_id,
                frame_number,
            },
        );
        ctx.send(
            self.id(),
            Command::FrameFinish {
                frame_id,
                frame_number,
            },
        );
        Ok(())
    }

    fn abort_pending(&mut self, message: &str) {
        self.core.fail_pending(message);
    }
}
