mod client;
mod memory;
mod namespace;
mod zk;

pub use client::{NamespaceClient, ancestry};
pub use memory::MemoryNamespace;
pub use namespace::{ErrorClass, Namespace, NamespaceError, NodeStat};
pub use zk::{DEFAULT_SESSION_TIMEOUT, ZkNamespace};
