use lockstep_shared::{BitReader, ConfigToken, ObjectId, ResourceKind, Serde};

use crate::error::ClientError;

/// One resource of the config as announced in its instance data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceLayout {
    pub kind: ResourceKind,
    pub id: ObjectId,
    pub children: Vec<ResourceLayout>,
}

impl ResourceLayout {
    fn new(kind: ResourceKind, id: ObjectId, children: Vec<ResourceLayout>) -> Self {
        Self { kind, id, children }
    }

    pub fn find(&self, id: ObjectId) -> Option<&ResourceLayout> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// The resource tree of a config, rebuilt on the render node
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigLayout {
    pub latency: u32,
    pub nodes: Vec<ResourceLayout>,
}

impl ConfigLayout {
    pub fn find(&self, id: ObjectId) -> Option<&ResourceLayout> {
        self.nodes.iter().find_map(|node| node.find(id))
    }
}

/// Reads config instance data. Tokens arrive children first: every
/// container takes all resources of the level below that are still
/// pending.
pub struct ConfigDeserializer {
    channels: Vec<ResourceLayout>,
    windows: Vec<ResourceLayout>,
    pipes: Vec<ResourceLayout>,
    nodes: Vec<ResourceLayout>,
}

impl ConfigDeserializer {
    pub fn deserialize(bytes: &[u8]) -> Result<ConfigLayout, ClientError> {
        let mut reader = BitReader::new(bytes);
        let latency = u32::de(&mut reader)?;

        let mut deserializer = Self {
            channels: Vec::new(),
            windows: Vec::new(),
            pipes: Vec::new(),
            nodes: Vec::new(),
        };
        loop {
            let token = ConfigToken::de(&mut reader)?;
            if token == ConfigToken::Last {
                break;
            }
            let id = ObjectId::de(&mut reader)?;
            deserializer.read(token, id);
        }

        if !deserializer.channels.is_empty()
            || !deserializer.windows.is_empty()
            || !deserializer.pipes.is_empty()
        {
            return Err(ClientError::MalformedConfig {
                reason: "resources without a container",
            });
        }
        Ok(ConfigLayout {
            latency,
            nodes: deserializer.nodes,
        })
    }

    fn read(&mut self, token: ConfigToken, id: ObjectId) {
        match token {
            ConfigToken::Channel => {
                self.channels
                    .push(ResourceLayout::new(ResourceKind::Channel, id, Vec::new()));
            }
            ConfigToken::Window => {
                let channels = std::mem::take(&mut self.channels);
                self.windows
                    .push(ResourceLayout::new(ResourceKind::Window, id, channels));
            }
            ConfigToken::Pipe => {
                let windows = std::mem::take(&mut self.windows);
                self.pipes
                    .push(ResourceLayout::new(ResourceKind::Pipe, id, windows));
            }
            ConfigToken::Node => {
                let pipes = std::mem::take(&mut self.pipes);
                self.nodes
                    .push(ResourceLayout::new(ResourceKind::Node, id, pipes));
            }
            ConfigToken::Last => {}
        }
    }
}
