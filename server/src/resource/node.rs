use std::{
    ops::Deref,
    sync::Arc,
    thread::JoinHandle,
    time::Duration,
};

use log::{debug, info, warn};

use lockstep_shared::{
    Barrier, Command, CommandBuffer, CommandDispatcher, Connection, ConnectionDescription,
    DispatchError, FrameId, FrameNumber, InitId, ObjectId, ResourceState, StateError,
};

use super::{
    abort_children, start_children_exit, start_children_init, sync_children_exit,
    sync_children_init, update_children, Pipe, Resource, ResourceCore, ResourceKind,
};
use crate::{
    error::ServerError,
    session::{Session, TaskContext},
};

/// A barrier allocated by a node, together with its session id
#[derive(Clone)]
pub struct BarrierHandle {
    id: ObjectId,
    barrier: Arc<Barrier>,
}

impl BarrierHandle {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn barrier(&self) -> &Arc<Barrier> {
        &self.barrier
    }

    /// Whether both handles refer to the same barrier instance
    pub fn ptr_eq(&self, other: &BarrierHandle) -> bool {
        Arc::ptr_eq(&self.barrier, &other.barrier)
    }
}

impl Deref for BarrierHandle {
    type Target = Barrier;

    fn deref(&self) -> &Barrier {
        &self.barrier
    }
}

/// A render process of the cluster. The node owns the connection its
/// commands travel on and batches every command of its subtree into one
/// send per step.
pub struct Node {
    core: ResourceCore,
    descriptions: Vec<ConnectionDescription>,
    connection: Option<Arc<dyn Connection>>,
    receiver: Option<JoinHandle<Result<(), DispatchError>>>,
    buffer: CommandBuffer,
    pipes: Vec<Pipe>,
    barriers: Vec<BarrierHandle>,
    free_barriers: Vec<BarrierHandle>,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Self {
            core: ResourceCore::new(ResourceKind::Node, name),
            descriptions: Vec::new(),
            connection: None,
            receiver: None,
            buffer: CommandBuffer::new(),
            pipes: Vec::new(),
            barriers: Vec::new(),
            free_barriers: Vec::new(),
        }
    }

    pub fn with_pipe(mut self, pipe: Pipe) -> Self {
        self.add_pipe(pipe);
        self
    }

    pub fn add_pipe(&mut self, pipe: Pipe) {
        self.pipes.push(pipe);
    }

    pub fn remove_pipe(&mut self, index: usize) -> Option<Pipe> {
        if index < self.pipes.len() {
            Some(self.pipes.remove(index))
        } else {
            None
        }
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    pub fn pipes_mut(&mut self) -> &mut [Pipe] {
        &mut self.pipes
    }

    pub fn add_description(&mut self, description: ConnectionDescription) {
        self.descriptions.push(description);
    }

    pub fn descriptions(&self) -> &[ConnectionDescription] {
        &self.descriptions
    }

    /// Uses `connection` for every command of this node's subtree
    pub fn connect(&mut self, connection: Arc<dyn Connection>) {
        if !self.descriptions.contains(connection.description()) {
            self.descriptions.push(connection.description().clone());
        }
        self.connection = Some(connection);
    }

    pub fn connection(&self) -> Option<&Arc<dyn Connection>> {
        self.connection.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| !connection.is_closed())
    }

    /// Highest frame the render node reported as finished
    pub fn finished_frame(&self) -> FrameNumber {
        self.core.finished_frame()
    }

    /// Routes replies arriving on this node's connection to `dispatcher`
    pub(crate) fn start_receiver(&mut self, dispatcher: &Arc<CommandDispatcher>) {
        if self.receiver.is_some() {
            return;
        }
        if let Some(connection) = &self.connection {
            debug!("node '{}' receives on {}", self.name(), connection.description());
            self.receiver = Some(dispatcher.spawn_receiver(connection.clone()));
        }
    }

    pub(crate) fn send(&mut self, target: ObjectId, command: Command) {
        self.buffer.push(target, command);
    }

    /// Sends every buffered command as one unit
    pub(crate) fn flush(&mut self) -> Result<(), ServerError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let Some(connection) = &self.connection else {
            self.buffer.clear();
            return Err(ServerError::NotConnected {
                node: self.name().to_string(),
            });
        };
        self.buffer.send_buffer(connection.as_ref())?;
        Ok(())
    }

    // Init

    /// Starts the init of this node and its used subtree. Panics if the node
    /// is not stopped.
    pub fn start_config_init(&mut self, init_id: InitId, instance_data: &[u8], session: &Session) {
        self.try_start_config_init(init_id, instance_data, session)
            .expect("node config init started from an invalid state");
    }

    pub fn try_start_config_init(
        &mut self,
        init_id: InitId,
        instance_data: &[u8],
        session: &Session,
    ) -> Result<(), StateError> {
        self.core.begin_init()?;
        let id = match session.register_resource(&mut self.core) {
            Ok(id) => id,
            Err(error) => {
                self.core.fail_init(&error.to_string());
                return Ok(());
            }
        };
        info!("TASK node '{}' config init {}", self.name(), init_id);

        let mut ctx = TaskContext::new(session, &mut self.buffer);
        ctx.send(
            id,
            Command::ConfigInit {
                init_id,
                name: self.core.name().to_string(),
                instance_data: instance_data.to_vec(),
            },
        );
        start_children_init(id, &mut self.pipes, init_id, &mut ctx);

        if let Err(error) = self.flush() {
            let message = error.to_string();
            self.core.fail_pending(&message);
            abort_children(&mut self.pipes, &message);
        }
        Ok(())
    }

    /// Waits for the init replies of this node and its subtree. Returns true
    /// iff every used resource is running.
    pub fn sync_config_init(&mut self, session: &Session) -> bool {
        let mut ctx = TaskContext::new(session, &mut self.buffer);
        let children = sync_children_init(&self.core, &mut self.pipes, &mut ctx);
        let state = self.core.wait_init(session.config().sync_timeout);
        children && state == ResourceState::Running
    }

    // Exit

    pub fn start_config_exit(&mut self, session: &Session) {
        self.try_start_config_exit(session)
            .expect("node config exit started from an invalid state");
    }

    pub fn try_start_config_exit(&mut self, session: &Session) -> Result<(), StateError> {
        self.core.begin_exit()?;
        let id = self.core.id();

        let mut ctx = TaskContext::new(session, &mut self.buffer);
        start_children_exit(&mut self.pipes, &mut ctx);
        info!("TASK node '{}' config exit", self.core.name());
        ctx.send(id, Command::ConfigExit);

        if let Err(error) = self.flush() {
            let message = error.to_string();
            self.core.fail_pending(&message);
            abort_children(&mut self.pipes, &message);
        }
        Ok(())
    }

    /// Waits for the exit replies, then destroys and deregisters the
    /// subtree and the barriers of this node. The node ends `Stopped` even
    /// if its exit failed.
    pub fn sync_config_exit(&mut self, session: &Session) -> bool {
        let success = self.core.wait_exit(session.config().sync_timeout);

        let id = self.core.id();
        let mut ctx = TaskContext::new(session, &mut self.buffer);
        let children = sync_children_exit(id, &mut self.pipes, &mut ctx);

        self.flush_barriers(session);
        if let Err(error) = self.flush() {
            warn!("node '{}' could not send teardown: {}", self.name(), error);
        }
        success && children
    }

    // Frames

    /// Sends one frame down the used subtree. Panics if the node or one of
    /// its used children is not running.
    pub fn update(&mut self, frame_id: FrameId, frame_number: FrameNumber, session: &Session) {
        if let Err(error) = self.try_update(frame_id, frame_number, session) {
            panic!("node update failed: {}", error);
        }
    }

    pub fn try_update(
        &mut self,
        frame_id: FrameId,
        frame_number: FrameNumber,
        session: &Session,
    ) -> Result<(), ServerError> {
        self.core.check_running("update")?;
        let id = self.core.id();
        debug!("TASK node '{}' start frame {}", self.name(), frame_number);

        let mut ctx = TaskContext::new(session, &mut self.buffer);
        ctx.send(
            id,
            Command::FrameStart {
                frame_id,
                frame_number,
            },
        );
        if let Err(error) = update_children(&mut self.pipes, frame_id, frame_number, &mut ctx) {
            self.buffer.clear();
            return Err(error.into());
        }
        ctx.send(
            id,
            Command::FrameFinish {
                frame_id,
                frame_number,
            },
        );
        debug!("TASK node '{}' finish frame {}", self.name(), frame_number);

        self.flush()
    }

    /// Blocks until the render node reported `frame_number` as finished.
    /// Returns false if `timeout` expired first.
    pub(crate) fn wait_frame_finished(
        &self,
        frame_number: FrameNumber,
        timeout: Option<Duration>,
    ) -> bool {
        let finished = self.core.shared().finished_frame();
        match timeout {
            None => {
                finished.wait_ge(frame_number);
                true
            }
            Some(timeout) => finished.wait_ge_timeout(frame_number, timeout).is_some(),
        }
    }

    // Barriers

    /// Returns a cached barrier of this node with its height reset to 0, or
    /// allocates and registers a new one
    pub fn get_barrier(&mut self, session: &Session) -> Result<BarrierHandle, ServerError> {
        if let Some(handle) = self.free_barriers.pop() {
            handle.set_height(0);
            return Ok(handle);
        }

        let retained = session.config().latency as usize + 1;
        let barrier = Arc::new(Barrier::new(0, retained));
        let id = session.registry().register_versioned(barrier.clone())?;
        let handle = BarrierHandle { id, barrier };
        self.barriers.push(handle.clone());
        Ok(handle)
    }

    /// Returns a barrier to the cache of this node
    pub fn release_barrier(&mut self, handle: BarrierHandle) {
        if !self.barriers.iter().any(|owned| owned.ptr_eq(&handle)) {
            warn!(
                "node '{}' cannot release barrier {} it does not own",
                self.name(),
                handle.id
            );
            return;
        }
        self.free_barriers.push(handle);
    }

    fn flush_barriers(&mut self, session: &Session) {
        self.free_barriers.clear();
        for handle in self.barriers.drain(..) {
            if let Err(error) = session.registry().deregister_object(handle.id) {
                warn!("node barrier {}: {}", handle.id, error);
            }
        }
    }
}

impl Resource for Node {
    fn core(&self) -> &ResourceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ResourceCore {
        &mut self.core
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
        if let Some(receiver) = self.receiver.take() {
            match receiver.join() {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!("node '{}' receiver: {}", self.core.name(), error),
                Err(_) => warn!("node '{}' receiver panicked", self.core.name()),
            }
        }
    }
}
