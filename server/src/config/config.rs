use std::{
    mem,
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use lockstep_shared::{
    Command, FrameId, FrameNumber, InitId, ObjectDelta, ObjectId, ResourceState, Serializable,
    SessionError, StatKind, StateError, VersionedObject, INVALID_ID,
};

use super::{
    config_serializer::ConfigSerializer,
    server_config::ServerConfig,
    statistics::ConfigStatistics,
    visitor::{ConfigVisitor, VisitorResult},
};
use crate::{
    error::ServerError,
    resource::{Node, Resource},
    session::Session,
};

/// Registry entry standing for the config itself
struct ConfigEntry;

/// The server side of a running session: owns the nodes of the cluster,
/// drives their init and exit, and issues one frame after the other while
/// keeping at most `latency` frames in flight.
pub struct Config {
    name: String,
    id: ObjectId,
    state: ResourceState,
    error: String,
    session: Arc<Session>,
    nodes: Vec<Node>,
    current_frame: FrameNumber,
    pending: Vec<ObjectDelta>,
    // indices of nodes whose init could not be started
    unstarted: Vec<usize>,
}

impl Config {
    pub fn new(name: &str, server_config: ServerConfig) -> Self {
        Self {
            name: name.to_string(),
            id: INVALID_ID,
            state: ResourceState::Stopped,
            error: String::new(),
            session: Arc::new(Session::new(server_config)),
            nodes: Vec::new(),
            current_frame: 0,
            pending: Vec::new(),
            unstarted: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ResourceState::Running
    }

    /// Failures collected by the last init, as `node: '<message>'`
    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn server_config(&self) -> &ServerConfig {
        self.session.config()
    }

    pub fn latency(&self) -> u32 {
        self.session.config().latency
    }

    pub fn statistics(&self) -> &Arc<ConfigStatistics> {
        self.session.statistics()
    }

    // Nodes

    /// Adds a node and returns its index
    pub fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn remove_node(&mut self, index: usize) -> Option<Node> {
        if index < self.nodes.len() {
            Some(self.nodes.remove(index))
        } else {
            None
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    pub fn accept(&mut self, visitor: &mut dyn ConfigVisitor) -> VisitorResult {
        for node in self.nodes.iter_mut() {
            if node.accept(visitor) == VisitorResult::Terminate {
                return VisitorResult::Terminate;
            }
        }
        VisitorResult::Continue
    }

    fn invalid(&self, operation: &'static str) -> StateError {
        StateError::InvalidTransition {
            resource: "config",
            name: self.name.clone(),
            operation,
            state: self.state,
        }
    }

    // Init

    /// Initializes every used node and waits for the result
    pub fn init(&mut self, init_id: InitId) -> bool {
        if let Err(error) = self.try_start_init(init_id) {
            warn!("config '{}' init: {}", self.name, error);
            return false;
        }
        self.sync_init()
    }

    /// Sends the init of every used node without waiting for replies. A node
    /// that cannot start is recorded as failed and its siblings still start;
    /// only a config in the wrong state is an error.
    pub fn try_start_init(&mut self, init_id: InitId) -> Result<(), ServerError> {
        if !self.state.can_start_init() {
            return Err(self.invalid("start config init").into());
        }
        info!("config '{}' init {}", self.name, init_id);

        if self.id == INVALID_ID {
            self.id = self.session.registry().register_object(Arc::new(ConfigEntry))?;
        }
        self.error.clear();
        self.unstarted.clear();
        self.current_frame = 0;

        let latency = self.latency();
        let instance_data = ConfigSerializer::serialize(&self.session, latency, &mut self.nodes)?;
        self.state = ResourceState::Initializing;

        let session = self.session.clone();
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if !node.is_used() {
                continue;
            }
            node.start_receiver(session.dispatcher());
            if let Err(error) = node.try_start_config_init(init_id, &instance_data, &session) {
                warn!("config '{}': {}", self.name, error);
                self.error.push_str(&format!("{}: '{}'", node.kind(), error));
                self.unstarted.push(index);
            }
        }
        Ok(())
    }

    /// Waits for every used node. Failing nodes are collected into
    /// `error`, the others are still waited for.
    pub fn sync_init(&mut self) -> bool {
        let session = self.session.clone();
        let unstarted = mem::take(&mut self.unstarted);
        let mut success = unstarted.is_empty();
        for (index, node) in self.nodes.iter_mut().enumerate() {
            if !node.is_used() || unstarted.contains(&index) {
                continue;
            }
            if !node.sync_config_init(&session) {
                self.error
                    .push_str(&format!("{}: '{}'", node.kind(), node.error()));
                success = false;
            }
        }

        self.state = if success {
            ResourceState::Running
        } else {
            ResourceState::InitFailed
        };
        info!("config '{}' init {}", self.name, self.state);
        success
    }

    // Exit

    pub fn exit(&mut self) -> bool {
        if let Err(error) = self.try_start_exit() {
            warn!("config '{}' exit: {}", self.name, error);
            return false;
        }
        self.sync_exit()
    }

    pub fn try_start_exit(&mut self) -> Result<(), ServerError> {
        if !self.state.can_start_exit() {
            return Err(self.invalid("start config exit").into());
        }
        info!("config '{}' exit", self.name);
        self.state = ResourceState::Stopping;

        let session = self.session.clone();
        for node in self
            .nodes
            .iter_mut()
            .filter(|node| node.state() != ResourceState::Stopped)
        {
            if let Err(error) = node.try_start_config_exit(&session) {
                warn!("{}", error);
            }
        }
        Ok(())
    }

    /// Waits for every node that holds an id, then deregisters it. The config
    /// is stopped afterwards whatever the nodes reported.
    pub fn sync_exit(&mut self) -> bool {
        let session = self.session.clone();
        let mut success = true;
        for node in self.nodes.iter_mut().filter(|node| node.id() != INVALID_ID) {
            if !node.sync_config_exit(&session) {
                success = false;
            }
            session.deregister_resource(node.core_mut());
        }

        if self.id != INVALID_ID {
            if let Err(error) = session.registry().deregister_object(self.id) {
                warn!("config '{}': {}", self.name, error);
            }
            self.id = INVALID_ID;
        }
        self.pending.clear();
        self.state = ResourceState::Stopped;
        info!("config '{}' stopped, clean exit: {}", self.name, success);
        success
    }

    // Frames

    pub fn current_frame(&self) -> FrameNumber {
        self.current_frame
    }

    /// Starts the next frame on every running node, returns its number.
    /// Panics if the config is not running.
    pub fn start_frame(&mut self, frame_id: FrameId) -> FrameNumber {
        match self.try_start_frame(frame_id) {
            Ok(frame_number) => frame_number,
            Err(error) => panic!("config start frame failed: {}", error),
        }
    }

    pub fn try_start_frame(&mut self, frame_id: FrameId) -> Result<FrameNumber, ServerError> {
        if !self.is_running() {
            return Err(self.invalid("start frame").into());
        }
        let start_time = self.statistics().now();
        self.current_frame += 1;
        let frame_number = self.current_frame;
        debug!("config '{}' start frame {}", self.name, frame_number);

        let deltas = mem::take(&mut self.pending);
        let session = self.session.clone();
        for node in self
            .nodes
            .iter_mut()
            .filter(|node| node.is_used() && node.state() == ResourceState::Running)
        {
            for delta in &deltas {
                node.send(delta.object_id, Command::ObjectDelta(delta.clone()));
            }
            if let Err(error) = node.try_update(frame_id, frame_number, &session) {
                // queued again for the next frame, ahead of newer changes
                let newer = mem::replace(&mut self.pending, deltas);
                self.pending.extend(newer);
                return Err(error);
            }
        }

        self.statistics().record_since(
            StatKind::ConfigStartFrame,
            self.id,
            frame_number,
            start_time,
        );
        Ok(frame_number)
    }

    /// Waits until no more than `latency` frames are outstanding. Returns
    /// the frame that is now finished.
    pub fn finish_frame(&mut self) -> Result<FrameNumber, ServerError> {
        let start_time = self.statistics().now();
        let frame_number = self.current_frame.saturating_sub(self.latency());
        self.wait_frame_finished(frame_number)?;
        self.statistics().record_since(
            StatKind::ConfigFinishFrame,
            self.id,
            self.current_frame,
            start_time,
        );
        Ok(frame_number)
    }

    /// Waits until every started frame is finished
    pub fn finish_all_frames(&mut self) -> Result<FrameNumber, ServerError> {
        let frame_number = self.current_frame;
        self.wait_frame_finished(frame_number)?;
        Ok(frame_number)
    }

    /// Blocks until every running node finished `frame_number`, at most for
    /// the configured frame timeout
    pub fn wait_frame_finished(&self, frame_number: FrameNumber) -> Result<(), ServerError> {
        if frame_number == 0 {
            return Ok(());
        }
        let start_time = self.statistics().now();
        let deadline = self
            .server_config()
            .frame_timeout
            .map(|timeout| Instant::now() + timeout);

        for node in self
            .nodes
            .iter()
            .filter(|node| node.is_used() && node.state() == ResourceState::Running)
        {
            let timeout = deadline
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .map(|remaining| remaining.max(Duration::from_millis(1)));
            if !node.wait_frame_finished(frame_number, timeout) {
                return Err(ServerError::FrameTimeout { frame_number });
            }
        }

        self.statistics().record_since(
            StatKind::ConfigWaitFinishFrame,
            self.id,
            frame_number,
            start_time,
        );
        Ok(())
    }

    /// Newest frame finished by every running node
    pub fn finished_frame(&self) -> FrameNumber {
        self.nodes
            .iter()
            .filter(|node| node.is_used() && node.state() == ResourceState::Running)
            .map(Node::finished_frame)
            .min()
            .unwrap_or(self.current_frame)
    }

    // Replication

    /// Registers a replicated object and queues its full state for the next
    /// frame. An object that is already registered keeps its id.
    pub fn register_object<T: Serializable>(
        &mut self,
        object: &mut VersionedObject<T>,
    ) -> Result<ObjectId, ServerError> {
        if object.is_attached() {
            return Ok(object.id());
        }
        T::LAYOUT.validate().map_err(SessionError::from)?;
        let id = self.session.registry().register_object(Arc::new(T::LAYOUT))?;
        object.attach(id);
        self.pending.push(object.commit_instance());
        Ok(id)
    }

    pub fn deregister_object<T: Serializable>(&mut self, object: &mut VersionedObject<T>) {
        if !object.is_attached() {
            return;
        }
        let id = object.id();
        if let Err(error) = self.session.registry().deregister_object(id) {
            warn!("config '{}': {}", self.name, error);
        }
        self.pending.retain(|delta| delta.object_id != id);
        object.detach();
    }

    /// Queues the pending changes of `object` for the next frame. Returns
    /// false if nothing changed or the object is not registered.
    pub fn distribute<T: Serializable>(&mut self, object: &mut VersionedObject<T>) -> bool {
        if !object.is_attached() {
            return false;
        }
        match object.commit() {
            Some(delta) => {
                self.pending.push(delta);
                true
            }
            None => false,
        }
    }

    /// Deltas waiting for the next frame
    pub fn pending_deltas(&self) -> &[ObjectDelta] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use lockstep_shared::{
        decode_batch, Command, Connection, LocalConnection, ResourceState, StateError,
    };

    use super::Config;
    use crate::{
        config::ServerConfig,
        error::ServerError,
        resource::{Node, Resource},
    };

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn frames_require_a_running_config() {
        let mut config = Config::new("idle", ServerConfig::default());
        assert_eq!(
            config.try_start_frame(1),
            Err(ServerError::State(StateError::InvalidTransition {
                resource: "config",
                name: "idle".to_string(),
                operation: "start frame",
                state: ResourceState::Stopped,
            }))
        );
    }

    #[test]
    fn node_without_connection_fails_init() {
        init_logging();
        let mut config = Config::new("lonely", ServerConfig::default());
        config.add_node(Node::new("render"));

        assert!(!config.init(1));
        assert_eq!(config.state(), ResourceState::InitFailed);
        assert_eq!(config.nodes()[0].state(), ResourceState::InitFailed);
        assert!(config.error().starts_with("node: '"));

        assert!(!config.exit());
        assert_eq!(config.nodes()[0].state(), ResourceState::Stopped);
        assert!(config.session().registry().is_empty());
    }

    #[test]
    fn start_init_sends_instance_data_to_the_node() {
        let (near, far) = LocalConnection::pair("render");
        let mut node = Node::new("render");
        node.connect(Arc::new(near));

        let mut config = Config::new("single", ServerConfig::default());
        config.add_node(node);
        config.try_start_init(9).unwrap();
        assert_eq!(config.nodes()[0].state(), ResourceState::Initializing);

        let packets = decode_batch(&far.receive().unwrap()).unwrap();
        assert_eq!(packets.len(), 1);
        let Command::ConfigInit {
            init_id,
            name,
            instance_data,
        } = &packets[0].command
        else {
            panic!("expected config init, got {:?}", packets[0].command);
        };
        assert_eq!(*init_id, 9);
        assert_eq!(name, "render");
        assert!(!instance_data.is_empty());
        assert_eq!(packets[0].target, config.nodes()[0].id());
    }

    #[test]
    fn node_that_cannot_start_does_not_hold_back_its_siblings() {
        init_logging();
        let (busy_near, _busy_far) = LocalConnection::pair("busy");
        let (idle_near, idle_far) = LocalConnection::pair("idle");
        let mut busy = Node::new("busy");
        busy.connect(Arc::new(busy_near));
        let mut idle = Node::new("idle");
        idle.connect(Arc::new(idle_near));

        let mut config = Config::new(
            "pair",
            ServerConfig {
                sync_timeout: Some(Duration::from_millis(20)),
                ..ServerConfig::default()
            },
        );
        config.add_node(busy);
        config.add_node(idle);
        config.nodes()[0]
            .core()
            .shared()
            .state()
            .set(ResourceState::Running);

        assert_eq!(config.try_start_init(1), Ok(()));
        assert_eq!(config.nodes()[1].state(), ResourceState::Initializing);
        let packets = decode_batch(&idle_far.receive().unwrap()).unwrap();
        assert!(matches!(packets[0].command, Command::ConfigInit { .. }));

        assert!(!config.sync_init());
        assert_eq!(config.state(), ResourceState::InitFailed);
        assert!(config.error().contains("start config init"));
        assert_eq!(config.nodes()[0].state(), ResourceState::Running);
        assert_eq!(config.nodes()[1].state(), ResourceState::InitFailed);
    }
}
