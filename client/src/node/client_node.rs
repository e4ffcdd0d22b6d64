use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
};

use log::{debug, info, trace, warn};

use lockstep_shared::{
    decode_batch, Command, CommandBuffer, CommandCode, Connection, ConnectionError, FrameId,
    FrameNumber, InitId, ObjectDelta, ObjectId, ObjectSlave, Packet, ResourceKind, ResourceState,
    Serializable, StatKind, INVALID_ID,
};

use crate::{
    client_config::ClientConfig,
    config_deserializer::{ConfigDeserializer, ConfigLayout},
    error::ClientError,
    statistics::{StatisticSampler, StatisticsSink},
};

use super::{
    delegate::{NodeDelegate, ResourceRef},
    replica::Replica,
};

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parent_kind(kind: ResourceKind) -> Option<ResourceKind> {
    match kind {
        ResourceKind::Node => None,
        ResourceKind::Pipe => Some(ResourceKind::Node),
        ResourceKind::Window => Some(ResourceKind::Pipe),
        ResourceKind::Channel => Some(ResourceKind::Window),
    }
}

/// Render-node mirror of one server resource
struct ResourceEntry {
    kind: ResourceKind,
    name: String,
    parent: Option<ObjectId>,
    state: ResourceState,
}

impl ResourceEntry {
    fn new(kind: ResourceKind, parent: Option<ObjectId>) -> Self {
        Self {
            kind,
            name: String::new(),
            parent,
            state: ResourceState::Stopped,
        }
    }

    fn as_ref(&self, id: ObjectId) -> ResourceRef<'_> {
        ResourceRef {
            kind: self.kind,
            id,
            name: &self.name,
            parent: self.parent,
        }
    }
}

/// Executes the commands a server sends to one render node.
///
/// Pipes, windows and channels are mirrored as the server creates them;
/// each task runs the matching `NodeDelegate` hook. Replies produced while
/// handling a batch are buffered and sent back as one unit once the whole
/// batch was handled.
pub struct ClientNode<D: NodeDelegate> {
    config: ClientConfig,
    connection: Arc<dyn Connection>,
    delegate: D,
    node_id: ObjectId,
    resources: HashMap<ObjectId, ResourceEntry>,
    replicas: HashMap<ObjectId, Arc<Mutex<dyn Replica>>>,
    unmapped: HashMap<ObjectId, Vec<ObjectDelta>>,
    buffer: CommandBuffer,
    statistics: Arc<StatisticsSink>,
    layout: Option<ConfigLayout>,
}

impl<D: NodeDelegate> ClientNode<D> {
    pub fn new(config: ClientConfig, connection: Arc<dyn Connection>, delegate: D) -> Self {
        let statistics = Arc::new(StatisticsSink::new(config.statistics));
        Self {
            config,
            connection,
            delegate,
            node_id: INVALID_ID,
            resources: HashMap::new(),
            replicas: HashMap::new(),
            unmapped: HashMap::new(),
            buffer: CommandBuffer::new(),
            statistics,
            layout: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Id of the server node this render node works for, `INVALID_ID`
    /// until the first config init arrived. Every new init after an exit
    /// rebinds it.
    pub fn node_id(&self) -> ObjectId {
        self.node_id
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    pub fn into_delegate(self) -> D {
        self.delegate
    }

    pub fn statistics(&self) -> &Arc<StatisticsSink> {
        &self.statistics
    }

    /// The resource tree announced by the last config init of the node
    pub fn layout(&self) -> Option<&ConfigLayout> {
        self.layout.as_ref()
    }

    pub fn resource_state(&self, id: ObjectId) -> Option<ResourceState> {
        self.resources.get(&id).map(|entry| entry.state)
    }

    /// Ids of the mirrored resources of one kind, in ascending order
    pub fn resource_ids(&self, kind: ResourceKind) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self
            .resources
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    // Replication

    /// Starts feeding `slave` with the deltas of its master. Deltas that
    /// arrived before the slave was mapped are applied right away.
    pub fn map_object<T: Serializable>(
        &mut self,
        slave: ObjectSlave<T>,
    ) -> Result<Arc<Mutex<ObjectSlave<T>>>, ClientError> {
        let object_id = slave.id();
        if self.replicas.contains_key(&object_id) {
            return Err(ClientError::DuplicateResource { id: object_id });
        }

        let slave = Arc::new(Mutex::new(slave));
        let replica: Arc<Mutex<dyn Replica>> = slave.clone();
        if let Some(queued) = self.unmapped.remove(&object_id) {
            let mut guard = lock(&replica);
            for delta in &queued {
                if let Err(error) = guard.apply(delta) {
                    warn!("ClientNode: queued delta dropped: {}", error);
                }
            }
        }
        self.replicas.insert(object_id, replica);
        info!("ClientNode: mapped {} {}", T::LAYOUT.name(), object_id);
        Ok(slave)
    }

    /// Stops feeding an object. Returns false if it was not mapped.
    pub fn unmap_object(&mut self, object_id: ObjectId) -> bool {
        self.replicas.remove(&object_id).is_some()
    }

    // Command processing

    /// Handles one received batch and sends the replies it produced.
    /// Returns the number of commands in the batch. A command that cannot be
    /// handled is logged and skipped; the rest of the batch still runs.
    pub fn process_batch(&mut self, bytes: &[u8]) -> Result<usize, ClientError> {
        let packets = decode_batch(bytes)?;
        let count = packets.len();
        for packet in packets {
            let code = packet.code();
            let target = packet.target;
            if let Err(error) = self.handle_packet(packet) {
                warn!(
                    "ClientNode: {} for {} failed: {}",
                    code.name(),
                    target,
                    error
                );
            }
        }
        self.buffer.send_buffer(self.connection.as_ref())?;
        Ok(count)
    }

    /// Processes batches until the connection closes
    pub fn run(&mut self) -> Result<(), ClientError> {
        loop {
            let bytes = match self.connection.receive() {
                Ok(bytes) => bytes,
                Err(ConnectionError::Closed { description }) => {
                    info!("ClientNode: {} closed", description);
                    return Ok(());
                }
                Err(error) => return Err(error.into()),
            };
            match self.process_batch(&bytes) {
                Ok(_) => {}
                Err(ClientError::Decode(error)) => {
                    warn!("ClientNode: dropping batch: {}", error);
                }
                Err(ClientError::Connection(ConnectionError::Closed { description })) => {
                    info!("ClientNode: {} closed before the replies were sent", description);
                    return Ok(());
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn handle_packet(&mut self, packet: Packet) -> Result<(), ClientError> {
        let Packet { target, command } = packet;
        match command {
            Command::ConfigInit {
                init_id,
                name,
                instance_data,
            } => self.config_init(target, init_id, name, &instance_data),
            Command::ConfigExit => self.config_exit(target),
            Command::CreatePipe { pipe_id } => {
                self.create_resource(target, ResourceKind::Pipe, pipe_id)
            }
            Command::CreateWindow { window_id } => {
                self.create_resource(target, ResourceKind::Window, window_id)
            }
            Command::CreateChannel { channel_id } => {
                self.create_resource(target, ResourceKind::Channel, channel_id)
            }
            Command::DestroyPipe { pipe_id } => {
                self.destroy_resource(target, ResourceKind::Pipe, pipe_id)
            }
            Command::DestroyWindow { window_id } => {
                self.destroy_resource(target, ResourceKind::Window, window_id)
            }
            Command::DestroyChannel { channel_id } => {
                self.destroy_resource(target, ResourceKind::Channel, channel_id)
            }
            Command::FrameStart {
                frame_id,
                frame_number,
            } => self.frame_start(target, frame_id, frame_number),
            Command::FrameFinish {
                frame_id,
                frame_number,
            } => self.frame_finish(target, frame_id, frame_number),
            Command::ObjectDelta(delta) => self.object_delta(delta),
            reply => Err(ClientError::UnexpectedCommand {
                kind: self
                    .resources
                    .get(&target)
                    .map_or(ResourceKind::Node, |entry| entry.kind),
                target,
                code: reply.code(),
            }),
        }
    }

    fn config_init(
        &mut self,
        target: ObjectId,
        init_id: InitId,
        name: String,
        instance_data: &[u8],
    ) -> Result<(), ClientError> {
        if !self.resources.contains_key(&target) && self.is_unbound() {
            self.bind(target);
        }

        let mut result = Ok(());
        if target == self.node_id && !instance_data.is_empty() {
            match ConfigDeserializer::deserialize(instance_data) {
                Ok(layout) => {
                    if layout.find(target).is_none() {
                        warn!("ClientNode: node {} missing from its config", target);
                    }
                    self.layout = Some(layout);
                }
                Err(error) => result = Err(error.to_string()),
            }
        }

        let entry = self
            .resources
            .get_mut(&target)
            .ok_or(ClientError::UnknownResource { target })?;
        entry.name = name;
        entry.state = ResourceState::Initializing;
        if result.is_ok() {
            result = self.delegate.config_init(entry.as_ref(target), init_id);
        }
        entry.state = if result.is_ok() {
            ResourceState::Running
        } else {
            ResourceState::InitFailed
        };
        info!(
            "TASK {} '{}' config init: {}",
            entry.kind,
            entry.name,
            result.is_ok()
        );

        self.buffer.push(
            target,
            Command::ConfigInitReply {
                result: result.is_ok(),
                error: result.err().unwrap_or_default(),
            },
        );
        Ok(())
    }

    /// True before the first config init and after the node exited. The
    /// server hands out fresh ids for every init, so the next node init
    /// may target an id this render node has never seen.
    fn is_unbound(&self) -> bool {
        self.resources
            .get(&self.node_id)
            .map_or(true, |node| {
                matches!(node.state, ResourceState::Stopped | ResourceState::StopFailed)
            })
    }

    fn bind(&mut self, target: ObjectId) {
        if self.node_id == INVALID_ID {
            info!("ClientNode: bound to node {}", target);
        } else {
            info!("ClientNode: rebound from node {} to {}", self.node_id, target);
        }
        self.node_id = target;
        self.resources.clear();
        self.unmapped.clear();
        self.layout = None;
        self.resources
            .insert(target, ResourceEntry::new(ResourceKind::Node, None));
    }

    fn config_exit(&mut self, target: ObjectId) -> Result<(), ClientError> {
        let entry = self
            .resources
            .get_mut(&target)
            .ok_or(ClientError::UnknownResource { target })?;
        entry.state = ResourceState::Stopping;
        let result = self.delegate.config_exit(entry.as_ref(target));
        entry.state = if result.is_ok() {
            ResourceState::Stopped
        } else {
            ResourceState::StopFailed
        };
        info!(
            "TASK {} '{}' config exit: {}",
            entry.kind,
            entry.name,
            result.is_ok()
        );

        if target == self.node_id {
            self.layout = None;
            self.unmapped.clear();
        }
        self.buffer.push(
            target,
            Command::ConfigExitReply {
                result: result.is_ok(),
                error: result.err().unwrap_or_default(),
            },
        );
        Ok(())
    }

    fn create_resource(
        &mut self,
        parent: ObjectId,
        kind: ResourceKind,
        id: ObjectId,
    ) -> Result<(), ClientError> {
        let parent_entry = self
            .resources
            .get(&parent)
            .ok_or(ClientError::UnknownResource { target: parent })?;
        if Some(parent_entry.kind) != parent_kind(kind) {
            return Err(ClientError::UnexpectedCommand {
                kind: parent_entry.kind,
                target: parent,
                code: match kind {
                    ResourceKind::Window => CommandCode::CreateWindow,
                    ResourceKind::Channel => CommandCode::CreateChannel,
                    _ => CommandCode::CreatePipe,
                },
            });
        }
        if self.resources.contains_key(&id) {
            return Err(ClientError::DuplicateResource { id });
        }

        debug!("ClientNode: create {} {} in {}", kind, id, parent);
        self.resources
            .insert(id, ResourceEntry::new(kind, Some(parent)));
        Ok(())
    }

    fn destroy_resource(
        &mut self,
        parent: ObjectId,
        kind: ResourceKind,
        id: ObjectId,
    ) -> Result<(), ClientError> {
        match self.resources.get(&id) {
            Some(entry) if entry.kind == kind && entry.parent == Some(parent) => {}
            _ => return Err(ClientError::UnknownResource { target: id }),
        }
        let mut subtree = vec![id];
        let mut next = 0;
        while let Some(&current) = subtree.get(next) {
            subtree.extend(
                self.resources
                    .iter()
                    .filter(|(_, entry)| entry.parent == Some(current))
                    .map(|(child, _)| *child),
            );
            next += 1;
        }
        if subtree.len() > 1 {
            warn!(
                "ClientNode: {} {} destroyed before its {} descendants",
                kind,
                id,
                subtree.len() - 1
            );
        }

        debug!("ClientNode: destroy {} {}", kind, id);
        for destroyed in subtree {
            self.resources.remove(&destroyed);
        }
        Ok(())
    }

    fn frame_start(
        &mut self,
        target: ObjectId,
        frame_id: FrameId,
        frame_number: FrameNumber,
    ) -> Result<(), ClientError> {
        let entry = self
            .resources
            .get(&target)
            .ok_or(ClientError::UnknownResource { target })?;
        trace!(
            "TASK {} '{}' frame start {}",
            entry.kind,
            entry.name,
            frame_number
        );

        let mut sampler =
            StatisticSampler::new(&self.statistics, StatKind::ChannelDraw, target, frame_number);
        if entry.kind != ResourceKind::Channel {
            sampler.ignore();
        }
        self.delegate
            .frame_start(entry.as_ref(target), frame_id, frame_number);
        Ok(())
    }

    fn frame_finish(
        &mut self,
        target: ObjectId,
        frame_id: FrameId,
        frame_number: FrameNumber,
    ) -> Result<(), ClientError> {
        let entry = self
            .resources
            .get(&target)
            .ok_or(ClientError::UnknownResource { target })?;
        trace!(
            "TASK {} '{}' frame finish {}",
            entry.kind,
            entry.name,
            frame_number
        );

        let kind = match entry.kind {
            ResourceKind::Node => StatKind::NodeFrameFinish,
            ResourceKind::Window => StatKind::WindowFinish,
            _ => StatKind::ChannelAssemble,
        };
        {
            let mut sampler =
                StatisticSampler::new(&self.statistics, kind, target, frame_number);
            if matches!(entry.kind, ResourceKind::Pipe | ResourceKind::Channel) {
                sampler.ignore();
            }
            self.delegate
                .frame_finish(entry.as_ref(target), frame_id, frame_number);
        }

        if entry.kind == ResourceKind::Node {
            self.buffer.push(
                target,
                Command::FrameFinishReply {
                    frame_number,
                    statistics: self.statistics.take_frame(frame_number),
                },
            );
        }
        Ok(())
    }

    fn object_delta(&mut self, delta: ObjectDelta) -> Result<(), ClientError> {
        if let Some(replica) = self.replicas.get(&delta.object_id) {
            let applied = lock(replica).apply(&delta)?;
            trace!(
                "ClientNode: object {} v{} applied: {}",
                delta.object_id,
                delta.version,
                applied
            );
            return Ok(());
        }

        debug!(
            "ClientNode: queueing v{} of unmapped object {}",
            delta.version, delta.object_id
        );
        let queue = self.unmapped.entry(delta.object_id).or_default();
        // a full instance supersedes everything queued before it
        if delta.instance {
            queue.clear();
        }
        queue.push(delta);
        Ok(())
    }
}

impl<D: NodeDelegate + 'static> ClientNode<D> {
    /// Runs this node on its own thread until the connection closes, then
    /// hands the node back
    pub fn spawn(mut self) -> JoinHandle<Result<Self, ClientError>> {
        thread::spawn(move || {
            self.run()?;
            Ok(self)
        })
    }
}
