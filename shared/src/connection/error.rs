use thiserror::Error;

use lockstep_serde::SerdeErr;

/// Errors that can occur while moving bytes over a connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The peer closed the connection, or it was closed locally
    #[error("connection {description} is closed")]
    Closed { description: String },

    /// Nothing arrived within the receive timeout
    #[error("no data received on {description} within the timeout")]
    Timeout { description: String },

    /// A received batch could not be decoded
    #[error("malformed command batch of {bytes} bytes: {source}")]
    Malformed { bytes: usize, source: SerdeErr },
}
