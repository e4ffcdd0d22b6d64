mod command_table;
mod dispatcher;
mod error;

pub use command_table::{CommandHandler, CommandResult, CommandTable};
pub use dispatcher::CommandDispatcher;
pub use error::DispatchError;
