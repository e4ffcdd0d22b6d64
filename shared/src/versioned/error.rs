use thiserror::Error;

use lockstep_serde::SerdeErr;

use crate::{types::ObjectId, types::ObjectVersion};

use super::DirtyMask;

/// Errors around dirty-bit bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirtyError {
    /// A thread panicked while holding the dirty mask lock
    #[error("dirty mask lock is poisoned")]
    LockPoisoned,

    /// A layout claims bits past the 64-bit mask
    #[error("dirty layout {layout} needs {bits} bits, only 64 are available")]
    LayoutOverflow { layout: &'static str, bits: u8 },

    /// Layouts must be named so collisions can be reported
    #[error("dirty layout has no name")]
    UnnamedLayout,
}

/// Errors applying a replicated delta on a slave instance
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    #[error("delta for object {received} applied to object {expected}")]
    WrongObject {
        expected: ObjectId,
        received: ObjectId,
    },

    #[error("object {object_id} at version {current} cannot apply version {received}")]
    VersionGap {
        object_id: ObjectId,
        current: ObjectVersion,
        received: ObjectVersion,
    },

    #[error("object {object_id} received unknown dirty bits {bits:?}")]
    UnknownBits { object_id: ObjectId, bits: DirtyMask },

    #[error("object {object_id} delta could not be decoded: {source}")]
    Decode {
        object_id: ObjectId,
        source: SerdeErr,
    },
}
