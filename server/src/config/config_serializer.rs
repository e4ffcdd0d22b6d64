use log::trace;

use lockstep_shared::{BitWriter, ConfigToken, ObjectId, Serde};

use super::visitor::{ConfigVisitor, VisitOrder, VisitorResult};
use crate::{
    error::ServerError,
    resource::{Channel, Node, Pipe, Resource, ResourceCore, Window},
    session::Session,
};

/// Writes the instance data of a config: its latency, then one
/// `(ConfigToken, id)` pair per used resource and a closing
/// `ConfigToken::Last`. Containers follow their children, so a reader
/// always knows every child before the container that holds it.
///
/// Resources without an id are registered on the way.
pub struct ConfigSerializer<'s> {
    session: &'s Session,
    writer: BitWriter,
    error: Option<ServerError>,
}

impl<'s> ConfigSerializer<'s> {
    pub fn new(session: &'s Session) -> Self {
        Self {
            session,
            writer: BitWriter::new(),
            error: None,
        }
    }

    pub fn serialize(
        session: &'s Session,
        latency: u32,
        nodes: &mut [Node],
    ) -> Result<Vec<u8>, ServerError> {
        let mut serializer = Self::new(session);
        latency.ser(&mut serializer.writer);
        for node in nodes.iter_mut() {
            if node.accept(&mut serializer) == VisitorResult::Terminate {
                break;
            }
        }
        serializer.finish()
    }

    fn finish(mut self) -> Result<Vec<u8>, ServerError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        ConfigToken::Last.ser(&mut self.writer);
        Ok(self.writer.to_bytes())
    }

    fn register(&mut self, core: &mut ResourceCore) -> VisitorResult {
        match self.session.register_resource(core) {
            Ok(_) => VisitorResult::Continue,
            Err(error) => {
                self.error = Some(error);
                VisitorResult::Terminate
            }
        }
    }

    fn write(&mut self, token: ConfigToken, id: ObjectId) {
        trace!("config instance {:?} {}", token, id);
        token.ser(&mut self.writer);
        id.ser(&mut self.writer);
    }

    fn visit(
        &mut self,
        core: &mut ResourceCore,
        token: ConfigToken,
        order: VisitOrder,
    ) -> VisitorResult {
        if !core.is_used() {
            return VisitorResult::Prune;
        }
        match order {
            VisitOrder::Pre => self.register(core),
            VisitOrder::Post => {
                self.write(token, core.id());
                VisitorResult::Continue
            }
        }
    }
}

impl ConfigVisitor for ConfigSerializer<'_> {
    fn visit_node(&mut self, node: &mut Node, order: VisitOrder) -> VisitorResult {
        self.visit(node.core_mut(), ConfigToken::Node, order)
    }

    fn visit_pipe(&mut self, pipe: &mut Pipe, order: VisitOrder) -> VisitorResult {
        self.visit(pipe.core_mut(), ConfigToken::Pipe, order)
    }

    fn visit_window(&mut self, window: &mut Window, order: VisitOrder) -> VisitorResult {
        self.visit(window.core_mut(), ConfigToken::Window, order)
    }

    fn visit_channel(&mut self, channel: &mut Channel) -> VisitorResult {
        let core = channel.core_mut();
        if !core.is_used() {
            return VisitorResult::Continue;
        }
        match self.register(core) {
            VisitorResult::Continue => {
                self.write(ConfigToken::Channel, core.id());
                VisitorResult::Continue
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use lockstep_shared::{BitReader, ConfigToken, ObjectId, Serde, INVALID_ID};

    use super::ConfigSerializer;
    use crate::{
        config::ServerConfig,
        resource::{Channel, Node, Pipe, Resource, Window},
        session::Session,
    };

    fn read_tokens(bytes: &[u8]) -> (u32, Vec<(ConfigToken, ObjectId)>) {
        let mut reader = BitReader::new(bytes);
        let latency = u32::de(&mut reader).unwrap();
        let mut tokens = Vec::new();
        loop {
            let token = ConfigToken::de(&mut reader).unwrap();
            if token == ConfigToken::Last {
                return (latency, tokens);
            }
            tokens.push((token, ObjectId::de(&mut reader).unwrap()));
        }
    }

    #[test]
    fn writes_used_resources_post_order() {
        let session = Session::new(ServerConfig::default());
        let window = Window::new("main").with_channel(Channel::new("left"));
        let mut nodes = vec![Node::new("render")
            .with_pipe(Pipe::new("gpu0").with_window(window))
            .with_pipe(Pipe::new("gpu1"))];
        nodes[0].pipes_mut()[1].set_used(false);

        let bytes = ConfigSerializer::serialize(&session, 2, &mut nodes).unwrap();
        let (latency, tokens) = read_tokens(&bytes);

        let node = &nodes[0];
        let pipe = &node.pipes()[0];
        let window = &pipe.windows()[0];
        let channel = &window.channels()[0];
        assert_eq!(latency, 2);
        assert_eq!(
            tokens,
            vec![
                (ConfigToken::Channel, channel.id()),
                (ConfigToken::Window, window.id()),
                (ConfigToken::Pipe, pipe.id()),
                (ConfigToken::Node, node.id()),
            ]
        );
        assert_eq!(node.pipes()[1].id(), INVALID_ID);
        assert_eq!(session.registry().len(), 4);
    }
}
