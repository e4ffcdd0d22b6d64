mod command_buffer;
mod connection;
mod description;
mod error;
mod local;

pub use command_buffer::{decode_batch, encode_batch, CommandBuffer};
pub use connection::Connection;
pub use description::{ConnectionDescription, ConnectionKind};
pub use error::ConnectionError;
pub use local::LocalConnection;
