use std::{sync::Arc, thread::JoinHandle, time::Duration};

use log::debug;

use lockstep_client::{ClientConfig, ClientError, ClientNode};
use lockstep_server::{Config, Node, ServerConfig};
use lockstep_shared::LocalConnection;

use super::{init_logging, RecordingDelegate};

type RenderThread = JoinHandle<Result<ClientNode<RecordingDelegate>, ClientError>>;

/// Server settings for tests: waits are bounded so a lost reply fails the
/// test instead of hanging it
pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        sync_timeout: Some(Duration::from_secs(5)),
        frame_timeout: Some(Duration::from_secs(5)),
        ..ServerConfig::default()
    }
}

/// A config whose nodes are served by in-process render nodes, one thread
/// each, connected through `LocalConnection` pairs
pub struct TestCluster {
    pub config: Config,
    render_threads: Vec<RenderThread>,
}

impl TestCluster {
    pub fn new(server_config: ServerConfig) -> Self {
        init_logging();
        Self {
            config: Config::new("test", server_config),
            render_threads: Vec::new(),
        }
    }

    /// Connects `node` to a new render node running `delegate`. Returns the
    /// index of the node in the config.
    pub fn add_node(&mut self, node: Node, delegate: RecordingDelegate) -> usize {
        self.add_node_with(node, delegate, |_| {})
    }

    /// Like `add_node`, with a chance to prepare the render node (e.g. map
    /// replicated objects) before it starts processing commands
    pub fn add_node_with<F>(&mut self, mut node: Node, delegate: RecordingDelegate, setup: F) -> usize
    where
        F: FnOnce(&mut ClientNode<RecordingDelegate>),
    {
        let (server_end, render_end) = LocalConnection::pair("test-node");
        node.connect(Arc::new(server_end));

        let mut render_node = ClientNode::new(ClientConfig::default(), Arc::new(render_end), delegate);
        setup(&mut render_node);
        self.render_threads.push(render_node.spawn());
        self.config.add_node(node)
    }

    pub fn node(&self, index: usize) -> &Node {
        self.config.node(index).expect("no node at this index")
    }

    pub fn node_mut(&mut self, index: usize) -> &mut Node {
        self.config.node_mut(index).expect("no node at this index")
    }

    /// Closes every node connection and waits for the render nodes to stop
    pub fn shutdown(mut self) -> Vec<ClientNode<RecordingDelegate>> {
        debug!("test cluster stops {} render nodes", self.render_threads.len());
        for node in self.config.nodes() {
            if let Some(connection) = node.connection() {
                connection.close();
            }
        }
        self.render_threads
            .drain(..)
            .map(|thread| {
                thread
                    .join()
                    .expect("render node panicked")
                    .expect("render node failed")
            })
            .collect()
    }
}
