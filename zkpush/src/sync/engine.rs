use std::path::Path;

use tracing::{debug, info};
use zkpush_core::{Namespace, NamespaceClient, NamespaceError};

use super::error::SyncError;
use super::paths::enumerate;

/// Uploads local trees into a namespace and removes remote subtrees.
///
/// Every call is sequential and blocking. A failed upload leaves the
/// already written nodes in place; re-running it is safe because node
/// creation skips existing nodes and writes overwrite.
pub struct SyncEngine<N> {
    client: NamespaceClient<N>,
}

impl<N: Namespace> SyncEngine<N> {
    pub fn new(namespace: N) -> Self {
        Self {
            client: NamespaceClient::new(namespace),
        }
    }

    pub fn client(&self) -> &NamespaceClient<N> {
        &self.client
    }

    /// Returns the number of files written.
    pub fn upload(&self, local: &Path, target: &str) -> Result<usize, SyncError> {
        let items = enumerate(local, target)?;
        for item in &items {
            let content = item.read_content()?;
            let created = self.client.ensure_path(&item.remote_path)?;
            self.client.write_content(&item.remote_path, &content)?;
            debug!(
                source = %item.source.display(),
                path = %item.remote_path,
                bytes = content.len(),
                created,
                "uploaded file"
            );
        }
        info!(
            source = %local.display(),
            target,
            files = items.len(),
            "upload finished"
        );
        Ok(items.len())
    }

    /// Removes `path` and everything below it, returning how many nodes went
    /// away. The empty path and absent nodes remove nothing.
    pub fn delete(&self, path: &str) -> Result<usize, SyncError> {
        let removed = self.delete_subtree(path)?;
        if removed > 0 {
            info!(path, removed, "delete finished");
        }
        Ok(removed)
    }

    pub fn exists(&self, path: &str) -> Result<bool, SyncError> {
        Ok(self.client.exists(path)?)
    }

    pub fn close(&self) -> Result<(), SyncError> {
        self.client.close().map_err(SyncError::Close)
    }

    pub fn into_namespace(self) -> N {
        self.client.into_inner()
    }

    fn delete_subtree(&self, path: &str) -> Result<usize, NamespaceError> {
        let Some(stat) = self.client.stat(path)? else {
            return Ok(0);
        };
        let children = match self.client.list_children(path) {
            Ok(children) => children,
            Err(err) if err.is_no_node() => return Ok(0),
            Err(err) => return Err(err),
        };
        let mut removed = 0;
        for child in children {
            removed += self.delete_subtree(&child_path(path, &child))?;
        }
        if self.client.delete_node(path, stat.version)? {
            removed += 1;
        }
        Ok(removed)
    }
}

fn child_path(parent: &str, child: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{child}")
    } else {
        format!("{parent}/{child}")
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
