use std::time::Duration;

use super::{description::ConnectionDescription, error::ConnectionError};

/// A reliable, ordered byte stream to one peer process.
///
/// Every `send` is delivered as one unit to the peer's `receive`, in order.
/// Establishing the stream is the transport's business.
pub trait Connection: Send + Sync {
    fn description(&self) -> &ConnectionDescription;

    fn send(&self, bytes: &[u8]) -> Result<(), ConnectionError>;

    /// Blocks until the next unit arrives or the connection closes
    fn receive(&self) -> Result<Vec<u8>, ConnectionError>;

    fn receive_timeout(&self, timeout: Duration) -> Result<Vec<u8>, ConnectionError>;

    /// Closes both directions; blocked receivers on either side wake up
    fn close(&self);

    fn is_closed(&self) -> bool;
}
