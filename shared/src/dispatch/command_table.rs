use std::collections::HashMap;

use crate::protocol::{CommandCode, Packet};

/// Outcome reported by a command handler
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandResult {
    Handled,
    Error(String),
}

pub type CommandHandler = Box<dyn Fn(&Packet) -> CommandResult + Send + Sync>;

/// Command code to handler mapping of one resource
#[derive(Default)]
pub struct CommandTable {
    handlers: HashMap<CommandCode, CommandHandler>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `code`, replacing any previous handler
    pub fn register_command<F>(&mut self, code: CommandCode, handler: F)
    where
        F: Fn(&Packet) -> CommandResult + Send + Sync + 'static,
    {
        self.handlers.insert(code, Box::new(handler));
    }

    pub fn with_command<F>(mut self, code: CommandCode, handler: F) -> Self
    where
        F: Fn(&Packet) -> CommandResult + Send + Sync + 'static,
    {
        self.register_command(code, handler);
        self
    }

    pub fn handler(&self, code: CommandCode) -> Option<&CommandHandler> {
        self.handlers.get(&code)
    }

    pub fn handles(&self, code: CommandCode) -> bool {
        self.handlers.contains_key(&code)
    }
}
