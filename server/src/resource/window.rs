use lockstep_shared::{Command, ObjectId};

use super::{container::Level, Channel, Container, ResourceKind};

/// A drawable of a pipe, holding the channels rendered into it
pub type Window = Container<Channel>;

impl Level for Window {
    const KIND: ResourceKind = ResourceKind::Window;

    fn create_command(id: ObjectId) -> Command {
        Command::CreateWindow { window_id: id }
    }

    fn destroy_command(id: ObjectId) -> Command {
        Command::DestroyWindow { window_id: id }
    }
}

impl Window {
    pub fn new(name: &str) -> Self {
        Self::named(name)
    }

    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.add_child(channel);
        self
    }

    pub fn add_channel(&mut self, channel: Channel) {
        self.add_child(channel);
    }

    pub fn channels(&self) -> &[Channel] {
        self.children()
    }

    pub fn channels_mut(&mut self) -> &mut [Channel] {
        self.children_mut()
    }
}
