use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::namespace::{Namespace, NamespaceError, NodeStat};

#[derive(Debug, Default)]
struct MemoryNode {
    data: Vec<u8>,
    version: i32,
}

#[derive(Debug, Default)]
struct MemoryState {
    nodes: BTreeMap<String, MemoryNode>,
    failing_writes: BTreeSet<String>,
    fail_close: bool,
    closed: bool,
    mutations: usize,
}

/// In-process [`Namespace`] that follows ZooKeeper's rules for paths,
/// parents and versions.
///
/// The root (`/`) always exists and cannot be deleted. Failures can be
/// injected to exercise partial uploads and close errors.
#[derive(Debug, Default)]
pub struct MemoryNamespace {
    state: Mutex<MemoryState>,
}

impl MemoryNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `set_data` on `path` fails with [`NamespaceError::Unavailable`].
    pub fn fail_next_write(&self, path: &str) {
        self.lock().failing_writes.insert(path.to_string());
    }

    pub fn fail_close(&self) {
        self.lock().fail_close = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of successful create, set and delete calls.
    pub fn mutations(&self) -> usize {
        self.lock().mutations
    }

    /// All node paths, sorted, excluding the root.
    pub fn paths(&self) -> Vec<String> {
        self.lock().nodes.keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate(path: &str) -> Result<(), NamespaceError> {
    let valid = path.starts_with('/')
        && (path == "/" || !path.ends_with('/'))
        && !path.contains("//");
    if valid {
        Ok(())
    } else {
        Err(NamespaceError::InvalidPath(path.to_string()))
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

fn is_direct_child(parent: &str, candidate: &str) -> Option<String> {
    let rest = if parent == "/" {
        candidate.strip_prefix('/')?
    } else {
        candidate.strip_prefix(parent)?.strip_prefix('/')?
    };
    (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
}

impl MemoryState {
    fn exists(&self, path: &str) -> bool {
        path == "/" || self.nodes.contains_key(path)
    }

    fn child_count(&self, path: &str) -> usize {
        self.nodes
            .keys()
            .filter(|candidate| is_direct_child(path, candidate).is_some())
            .count()
    }

    fn stat_of(&self, path: &str) -> Option<NodeStat> {
        let (version, data_length) = if path == "/" {
            (0, 0)
        } else {
            let node = self.nodes.get(path)?;
            (node.version, node.data.len() as i32)
        };
        Some(NodeStat {
            version,
            data_length,
            num_children: self.child_count(path) as i32,
        })
    }

    fn check_version(&self, path: &str, expected: Option<i32>) -> Result<(), NamespaceError> {
        let actual = self.nodes.get(path).map(|node| node.version).unwrap_or(0);
        match expected {
            Some(expected) if expected != -1 && expected != actual => {
                Err(NamespaceError::BadVersion {
                    path: path.to_string(),
                    expected,
                    actual,
                })
            }
            _ => Ok(()),
        }
    }
}

impl Namespace for MemoryNamespace {
    fn stat(&self, path: &str) -> Result<Option<NodeStat>, NamespaceError> {
        validate(path)?;
        Ok(self.lock().stat_of(path))
    }

    fn create(&self, path: &str) -> Result<(), NamespaceError> {
        validate(path)?;
        let mut state = self.lock();
        if state.exists(path) {
            return Err(NamespaceError::NodeExists(path.to_string()));
        }
        let parent = parent_of(path);
        if !state.exists(parent) {
            return Err(NamespaceError::NoNode(parent.to_string()));
        }
        state.nodes.insert(path.to_string(), MemoryNode::default());
        state.mutations += 1;
        Ok(())
    }

    fn set_data(
        &self,
        path: &str,
        data: &[u8],
        version: Option<i32>,
    ) -> Result<NodeStat, NamespaceError> {
        validate(path)?;
        let mut state = self.lock();
        if state.failing_writes.remove(path) {
            return Err(NamespaceError::Unavailable(path.to_string()));
        }
        if !state.nodes.contains_key(path) {
            return Err(NamespaceError::NoNode(path.to_string()));
        }
        state.check_version(path, version)?;
        if let Some(node) = state.nodes.get_mut(path) {
            node.data = data.to_vec();
            node.version += 1;
        }
        state.mutations += 1;
        state
            .stat_of(path)
            .ok_or_else(|| NamespaceError::NoNode(path.to_string()))
    }

    fn get_data(&self, path: &str) -> Result<Option<Vec<u8>>, NamespaceError> {
        validate(path)?;
        let state = self.lock();
        if path == "/" {
            return Ok(Some(Vec::new()));
        }
        Ok(state.nodes.get(path).map(|node| node.data.clone()))
    }

    fn children(&self, path: &str) -> Result<Vec<String>, NamespaceError> {
        validate(path)?;
        let state = self.lock();
        if !state.exists(path) {
            return Err(NamespaceError::NoNode(path.to_string()));
        }
        Ok(state
            .nodes
            .keys()
            .filter_map(|candidate| is_direct_child(path, candidate))
            .collect())
    }

    fn delete(&self, path: &str, version: Option<i32>) -> Result<(), NamespaceError> {
        validate(path)?;
        if path == "/" {
            return Err(NamespaceError::InvalidPath(path.to_string()));
        }
        let mut state = self.lock();
        if !state.nodes.contains_key(path) {
            return Err(NamespaceError::NoNode(path.to_string()));
        }
        state.check_version(path, version)?;
        if state.child_count(path) > 0 {
            return Err(NamespaceError::NotEmpty(path.to_string()));
        }
        state.nodes.remove(path);
        state.mutations += 1;
        Ok(())
    }

    fn close(&self) -> Result<(), NamespaceError> {
        let mut state = self.lock();
        state.closed = true;
        if state.fail_close {
            return Err(NamespaceError::Unavailable("/".to_string()));
        }
        Ok(())
    }
}
