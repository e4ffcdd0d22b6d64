mod command_code;
mod config_token;
mod packet;
mod stat_event;

pub use command_code::CommandCode;
pub use config_token::ConfigToken;
pub use packet::{Command, Packet};
pub use stat_event::{StatEvent, StatKind};
