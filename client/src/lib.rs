//! # Lockstep Client
//! The render node side of a lockstep cluster: executes the tasks the
//! server sends for a node and its pipes, windows and channels, replies
//! with results and frame statistics, and keeps replicated objects such as
//! `ViewData` up to date.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use lockstep_shared::{
        Connection, ConnectionDescription, ConnectionError, FrameId, FrameNumber, InitId,
        LocalConnection, ObjectDelta, ObjectId, ObjectSlave, ResourceKind, ResourceState,
        Serializable, StatEvent, StatKind, INVALID_ID,
    };
}

pub mod event;

mod client_config;
mod config_deserializer;
mod error;
mod node;
mod statistics;
mod view_data;

pub use client_config::ClientConfig;
pub use config_deserializer::{ConfigDeserializer, ConfigLayout, ResourceLayout};
pub use error::ClientError;
pub use node::{ClientNode, NodeDelegate, NoopDelegate, Replica, ResourceRef};
pub use statistics::{StatisticSampler, StatisticsSink};
pub use view_data::{
    ViewData, DIRTY_MODEL_MATRIX, DIRTY_ORTHO, DIRTY_STATISTICS, VIEW_DATA_LAYOUT,
};
