mod client_node;
mod delegate;
mod replica;

pub use client_node::ClientNode;
pub use delegate::{NodeDelegate, NoopDelegate, ResourceRef};
pub use replica::Replica;
