mod config;
mod config_serializer;
mod server_config;
mod statistics;
mod visitor;

pub use config::Config;
pub use config_serializer::ConfigSerializer;
pub use server_config::ServerConfig;
pub use statistics::ConfigStatistics;
pub use visitor::{ConfigVisitor, VisitOrder, VisitorResult};
