mod error;
mod registry;

pub use error::SessionError;
pub use registry::ObjectRegistry;
