use thiserror::Error;

use crate::{types::ObjectId, versioned::DirtyError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("object {object_id} is not registered with this session")]
    UnknownObject { object_id: ObjectId },

    #[error("object {object_id} is not a {expected}")]
    WrongType {
        object_id: ObjectId,
        expected: &'static str,
    },

    #[error("session ran out of object ids")]
    IdsExhausted,

    #[error("object registry lock is poisoned")]
    LockPoisoned,

    #[error("invalid dirty layout: {0}")]
    Layout(#[from] DirtyError),
}
