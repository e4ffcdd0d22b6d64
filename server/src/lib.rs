//! # Lockstep Server
//! Drives the nodes, pipes, windows and channels of a rendering cluster
//! through init, frames and exit by sending commands to their render
//! processes and folding the replies back into each resource's state.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use lockstep_shared::{
        Barrier, BarrierError, Connection, ConnectionDescription, ConnectionError, ConnectionKind,
        DirtyLayout, DirtyMask, FrameId, FrameNumber, InitId, LocalConnection, ObjectDelta,
        ObjectId, ResourceState, Serializable, StatEvent, StatKind, StateError, VersionedObject,
        INVALID_ID,
    };
}

mod config;
mod error;
mod resource;
mod session;

pub use config::{
    Config, ConfigSerializer, ConfigStatistics, ConfigVisitor, ServerConfig, VisitOrder,
    VisitorResult,
};
pub use error::ServerError;
pub use resource::{
    BarrierHandle, Channel, Container, Node, Pipe, Resource, ResourceCore, ResourceKind,
    ResourceShared, Window,
};
pub use session::Session;
