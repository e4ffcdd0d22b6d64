use std::sync::Arc;

use log::warn;

use lockstep_shared::{
    CommandBuffer, CommandDispatcher, Command, ObjectId, ObjectRegistry, INVALID_ID,
};

use crate::{
    config::{ConfigStatistics, ServerConfig},
    error::ServerError,
    resource::ResourceCore,
};

/// Everything the resources of one config share: the object registry, the
/// dispatcher of inbound replies, statistics and settings
pub struct Session {
    registry: Arc<ObjectRegistry>,
    dispatcher: Arc<CommandDispatcher>,
    statistics: Arc<ConfigStatistics>,
    config: ServerConfig,
}

impl Session {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(ObjectRegistry::new()),
            dispatcher: Arc::new(CommandDispatcher::new()),
            statistics: Arc::new(ConfigStatistics::new(config.statistics_frames)),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<ObjectRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<CommandDispatcher> {
        &self.dispatcher
    }

    pub fn statistics(&self) -> &Arc<ConfigStatistics> {
        &self.statistics
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Gives `resource` an id and routes its replies to it. A resource that
    /// already holds an id keeps it.
    pub(crate) fn register_resource(
        &self,
        resource: &mut ResourceCore,
    ) -> Result<ObjectId, ServerError> {
        if resource.id() != INVALID_ID {
            return Ok(resource.id());
        }

        let shared = resource.shared().clone();
        let id = self.registry.register_object(shared.clone())?;
        if let Err(error) = self
            .dispatcher
            .register(id, shared.command_table(self.statistics.clone()))
        {
            let _ = self.registry.deregister_object(id);
            return Err(error.into());
        }
        resource.set_id(id);
        Ok(id)
    }

    pub(crate) fn deregister_resource(&self, resource: &mut ResourceCore) {
        let id = resource.id();
        if id == INVALID_ID {
            return;
        }
        self.dispatcher.deregister(id);
        if let Err(error) = self.registry.deregister_object(id) {
            warn!("{} '{}': {}", resource.kind().name(), resource.name(), error);
        }
        resource.set_id(INVALID_ID);
    }
}

/// Where the tasks of a node's resources go: the session they belong to and
/// the command buffer of their node
pub(crate) struct TaskContext<'a> {
    pub session: &'a Session,
    pub buffer: &'a mut CommandBuffer,
}

impl<'a> TaskContext<'a> {
    pub fn new(session: &'a Session, buffer: &'a mut CommandBuffer) -> Self {
        Self { session, buffer }
    }

    pub fn send(&mut self, target: ObjectId, command: Command) {
        self.buffer.push(target, command);
    }
}
