pub mod dirty_layout;
pub mod dirty_mask;
pub mod dirty_tracker;
pub mod error;
pub mod object_delta;
pub mod object_slave;
pub mod serializable;
pub mod versioned_object;

pub use dirty_layout::DirtyLayout;
pub use dirty_mask::DirtyMask;
pub use dirty_tracker::DirtyTracker;
pub use error::{DirtyError, ReplicationError};
pub use object_delta::ObjectDelta;
pub use object_slave::ObjectSlave;
pub use serializable::{ObjectBase, Serializable, DIRTY_NAME, OBJECT_LAYOUT};
pub use versioned_object::VersionedObject;
