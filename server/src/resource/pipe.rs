use lockstep_shared::{Command, ObjectId};

use super::{container::Level, Container, ResourceKind, Window};

/// A GPU of a node and the windows it drives
pub type Pipe = Container<Window>;

impl Level for Pipe {
    const KIND: ResourceKind = ResourceKind::Pipe;

    fn create_command(id: ObjectId) -> Command {
        Command::CreatePipe { pipe_id: id }
    }

    fn destroy_command(id: ObjectId) -> Command {
        Command::DestroyPipe { pipe_id: id }
    }
}

impl Pipe {
    pub fn new(name: &str) -> Self {
        Self::named(name)
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.add_child(window);
        self
    }

    pub fn add_window(&mut self, window: Window) {
        self.add_child(window);
    }

    pub fn windows(&self) -> &[Window] {
        self.children()
    }

    pub fn windows_mut(&mut self) -> &mut [Window] {
        self.children_mut()
    }
}
