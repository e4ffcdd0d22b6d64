//! # Lockstep Shared
//! Common functionality shared between lockstep-server & lockstep-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use lockstep_serde::{
    BitCounter, BitReader, BitWrite, BitWriter, ConstBitLength, OwnedBitReader, Serde, SerdeErr,
    UnsignedInteger, UnsignedVariableInteger,
};

mod barrier;
mod connection;
mod dispatch;
mod monitor;
mod protocol;
mod session;
mod state;
mod types;
mod versioned;

pub use barrier::{Barrier, BarrierError, BARRIER_LAYOUT, DIRTY_HEIGHT};
pub use connection::{
    decode_batch, encode_batch, CommandBuffer, Connection, ConnectionDescription,
    ConnectionError, ConnectionKind, LocalConnection,
};
pub use dispatch::{CommandDispatcher, CommandHandler, CommandResult, CommandTable, DispatchError};
pub use monitor::Monitor;
pub use protocol::{Command, CommandCode, ConfigToken, Packet, StatEvent, StatKind};
pub use session::{ObjectRegistry, SessionError};
pub use state::{ResourceKind, ResourceState, StateError};
pub use types::{
    FrameId, FrameNumber, InitId, ObjectId, ObjectVersion, INVALID_ID, VERSION_FIRST, VERSION_NONE,
};
pub use versioned::{
    DirtyError, DirtyLayout, DirtyMask, DirtyTracker, ObjectBase, ObjectDelta, ObjectSlave,
    ReplicationError, Serializable, VersionedObject, DIRTY_NAME, OBJECT_LAYOUT,
};
