/// Network-visible identity of a registered object or resource
pub type ObjectId = u32;
/// Frame counter, starts at 1 for the first frame of a session
pub type FrameNumber = u32;
/// Application-chosen identifier for a frame, usually the version of the
/// frame data committed for it
pub type FrameId = u32;
/// Identifier of the init data handed to every resource on config init
pub type InitId = u32;
/// Version of a versioned object, incremented on every commit
pub type ObjectVersion = u32;

/// Sentinel id of an object that is not registered with any session
pub const INVALID_ID: ObjectId = u32::MAX;

/// First version of a freshly registered versioned object
pub const VERSION_FIRST: ObjectVersion = 1;
/// Version of an object that has never been committed
pub const VERSION_NONE: ObjectVersion = 0;
