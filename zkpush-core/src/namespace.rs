use std::sync::Arc;

use thiserror::Error;
use zookeeper::ZkError;

#[derive(Debug, Error)]
pub enum NamespaceError {
    #[error("node does not exist: {0}")]
    NoNode(String),
    #[error("node already exists: {0}")]
    NodeExists(String),
    #[error("version mismatch on {path}: expected {expected}, found {actual}")]
    BadVersion {
        path: String,
        expected: i32,
        actual: i32,
    },
    #[error("node has children: {0}")]
    NotEmpty(String),
    #[error("invalid node path: {0:?}")]
    InvalidPath(String),
    #[error("failed to connect to {connection_string}: {source}")]
    Connect {
        connection_string: String,
        #[source]
        source: ZkError,
    },
    #[error("namespace unavailable at {0}")]
    Unavailable(String),
    #[error("zookeeper error on {path}: {source}")]
    ZooKeeper {
        path: String,
        #[source]
        source: ZkError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Missing,
    Conflict,
    Transient,
    Permanent,
}

impl NamespaceError {
    pub(crate) fn from_zk(path: &str, source: ZkError) -> Self {
        match source {
            ZkError::NoNode => NamespaceError::NoNode(path.to_string()),
            ZkError::NodeExists => NamespaceError::NodeExists(path.to_string()),
            ZkError::NotEmpty => NamespaceError::NotEmpty(path.to_string()),
            ZkError::BadArguments => NamespaceError::InvalidPath(path.to_string()),
            source => NamespaceError::ZooKeeper {
                path: path.to_string(),
                source,
            },
        }
    }

    pub fn classification(&self) -> ErrorClass {
        match self {
            NamespaceError::NoNode(_) => ErrorClass::Missing,
            NamespaceError::NodeExists(_)
            | NamespaceError::BadVersion { .. }
            | NamespaceError::NotEmpty(_) => ErrorClass::Conflict,
            NamespaceError::Unavailable(_) => ErrorClass::Transient,
            NamespaceError::Connect { source, .. } | NamespaceError::ZooKeeper { source, .. } => {
                classify_zk(source)
            }
            NamespaceError::InvalidPath(_) => ErrorClass::Permanent,
        }
    }

    pub fn is_no_node(&self) -> bool {
        self.classification() == ErrorClass::Missing
    }

    /// Nothing in this crate retries; callers may re-run the whole operation.
    pub fn is_retryable(&self) -> bool {
        self.classification() == ErrorClass::Transient
    }
}

fn classify_zk(source: &ZkError) -> ErrorClass {
    match source {
        ZkError::NoNode => ErrorClass::Missing,
        ZkError::NodeExists | ZkError::BadVersion | ZkError::NotEmpty => ErrorClass::Conflict,
        ZkError::ConnectionLoss | ZkError::OperationTimeout | ZkError::SessionExpired => {
            ErrorClass::Transient
        }
        _ => ErrorClass::Permanent,
    }
}

/// Metadata of a single node, as far as this tool cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStat {
    pub version: i32,
    pub data_length: i32,
    pub num_children: i32,
}

/// Raw primitives of a hierarchical znode service.
///
/// Paths are absolute (`/a/b`). Implementations do not create ancestors on
/// their own; `create` fails with [`NamespaceError::NoNode`] when the parent
/// is missing.
pub trait Namespace {
    fn stat(&self, path: &str) -> Result<Option<NodeStat>, NamespaceError>;

    /// Creates a persistent, world-accessible node with empty content.
    fn create(&self, path: &str) -> Result<(), NamespaceError>;

    /// `None` skips the version check.
    fn set_data(
        &self,
        path: &str,
        data: &[u8],
        version: Option<i32>,
    ) -> Result<NodeStat, NamespaceError>;

    fn get_data(&self, path: &str) -> Result<Option<Vec<u8>>, NamespaceError>;

    fn children(&self, path: &str) -> Result<Vec<String>, NamespaceError>;

    /// `None` skips the version check.
    fn delete(&self, path: &str, version: Option<i32>) -> Result<(), NamespaceError>;

    fn close(&self) -> Result<(), NamespaceError> {
        Ok(())
    }
}

impl<N: Namespace + ?Sized> Namespace for Arc<N> {
    fn stat(&self, path: &str) -> Result<Option<NodeStat>, NamespaceError> {
        (**self).stat(path)
    }

    fn create(&self, path: &str) -> Result<(), NamespaceError> {
        (**self).create(path)
    }

    fn set_data(
        &self,
        path: &str,
        data: &[u8],
        version: Option<i32>,
    ) -> Result<NodeStat, NamespaceError> {
        (**self).set_data(path, data, version)
    }

    fn get_data(&self, path: &str) -> Result<Option<Vec<u8>>, NamespaceError> {
        (**self).get_data(path)
    }

    fn children(&self, path: &str) -> Result<Vec<String>, NamespaceError> {
        (**self).children(path)
    }

    fn delete(&self, path: &str, version: Option<i32>) -> Result<(), NamespaceError> {
        (**self).delete(path, version)
    }

    fn close(&self) -> Result<(), NamespaceError> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_zk_codes_to_typed_errors() {
        assert!(matches!(
            NamespaceError::from_zk("/a", ZkError::NoNode),
            NamespaceError::NoNode(path) if path == "/a"
        ));
        assert!(matches!(
            NamespaceError::from_zk("/a", ZkError::NodeExists),
            NamespaceError::NodeExists(_)
        ));
        assert!(matches!(
            NamespaceError::from_zk("a", ZkError::BadArguments),
            NamespaceError::InvalidPath(_)
        ));
    }

    #[test]
    fn session_loss_is_retryable() {
        let err = NamespaceError::from_zk("/a", ZkError::SessionExpired);
        assert!(err.is_retryable());
        assert!(!err.is_no_node());

        let err = NamespaceError::from_zk("/a", ZkError::ConnectionLoss);
        assert_eq!(err.classification(), ErrorClass::Transient);
    }

    #[test]
    fn conflicts_are_not_retryable() {
        let err = NamespaceError::BadVersion {
            path: "/a".to_string(),
            expected: 1,
            actual: 2,
        };
        assert_eq!(err.classification(), ErrorClass::Conflict);
        assert!(!err.is_retryable());
    }
}
