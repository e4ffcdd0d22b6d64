use thiserror::Error;

/// The stream ended early or carried a value that cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to decode value from bit stream")]
pub struct SerdeErr;
