use tracing::debug;

use crate::namespace::{Namespace, NamespaceError, NodeStat};

/// Path-level operations on top of a raw [`Namespace`].
///
/// Assumes a single writer: versions are read right before each write or
/// delete, so the version checks never reject our own operations.
pub struct NamespaceClient<N> {
    namespace: N,
}

impl<N: Namespace> NamespaceClient<N> {
    pub fn new(namespace: N) -> Self {
        Self { namespace }
    }

    pub fn namespace(&self) -> &N {
        &self.namespace
    }

    pub fn into_inner(self) -> N {
        self.namespace
    }

    /// The empty path never exists.
    pub fn exists(&self, path: &str) -> Result<bool, NamespaceError> {
        if path.is_empty() {
            return Ok(false);
        }
        Ok(self.namespace.stat(path)?.is_some())
    }

    /// Creates every missing node from the root down to `path`, returning how
    /// many were created.
    pub fn ensure_path(&self, path: &str) -> Result<usize, NamespaceError> {
        if path.is_empty() || self.exists(path)? {
            return Ok(0);
        }
        let mut created = 0;
        for prefix in ancestry(path) {
            if !self.exists(prefix)? {
                debug!(path = prefix, "creating node");
                self.namespace.create(prefix)?;
                created += 1;
            }
        }
        Ok(created)
    }

    /// Overwrites the content of an existing node, last writer wins. An
    /// absent node is not recreated and comes back as [`NamespaceError::NoNode`].
    pub fn write_content(&self, path: &str, data: &[u8]) -> Result<NodeStat, NamespaceError> {
        let version = self.namespace.stat(path)?.map(|stat| stat.version);
        debug!(path, bytes = data.len(), ?version, "writing node content");
        self.namespace.set_data(path, data, version)
    }

    pub fn read_content(&self, path: &str) -> Result<Option<Vec<u8>>, NamespaceError> {
        if path.is_empty() {
            return Ok(None);
        }
        self.namespace.get_data(path)
    }

    pub fn stat(&self, path: &str) -> Result<Option<NodeStat>, NamespaceError> {
        if path.is_empty() {
            return Ok(None);
        }
        self.namespace.stat(path)
    }

    pub fn list_children(&self, path: &str) -> Result<Vec<String>, NamespaceError> {
        self.namespace.children(path)
    }

    /// Deletes exactly one node. Returns `false` when it was already gone.
    pub fn delete_node(&self, path: &str, expected_version: i32) -> Result<bool, NamespaceError> {
        debug!(path, version = expected_version, "deleting node");
        match self.namespace.delete(path, Some(expected_version)) {
            Ok(()) => Ok(true),
            Err(err) if err.is_no_node() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn close(&self) -> Result<(), NamespaceError> {
        self.namespace.close()
    }
}

/// Every proper prefix of `path` that ends right before a `/`, followed by
/// `path` itself. The leading `/` never yields an (empty) prefix.
pub fn ancestry(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/')
        .map(|(idx, _)| idx)
        .filter(|idx| *idx > 0)
        .map(move |idx| &path[..idx])
        .chain(std::iter::once(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestry_walks_root_to_leaf() {
        let prefixes: Vec<_> = ancestry("/a/b/c").collect();
        assert_eq!(prefixes, vec!["/a", "/a/b", "/a/b/c"]);
    }

    #[test]
    fn ancestry_of_top_level_node_is_itself() {
        let prefixes: Vec<_> = ancestry("/a").collect();
        assert_eq!(prefixes, vec!["/a"]);
    }
}
