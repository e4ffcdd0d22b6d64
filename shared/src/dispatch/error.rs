use thiserror::Error;

use lockstep_serde::SerdeErr;

use crate::{connection::ConnectionError, protocol::CommandCode, types::ObjectId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no command table registered for object {target}")]
    UnknownTarget { target: ObjectId },

    #[error("object {target} has no handler for {code:?}")]
    UnhandledCommand { target: ObjectId, code: CommandCode },

    #[error("handler for {code:?} on object {target} failed: {message}")]
    HandlerFailed {
        target: ObjectId,
        code: CommandCode,
        message: String,
    },

    #[error("object {target} already has a command table")]
    AlreadyRegistered { target: ObjectId },

    #[error("malformed command batch: {0}")]
    Decode(#[from] SerdeErr),

    #[error("receive failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("dispatcher lock is poisoned")]
    LockPoisoned,
}
