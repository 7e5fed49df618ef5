use std::io;
use std::path::PathBuf;

use thiserror::Error;
use zkpush_core::NamespaceError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("input path does not exist or is not a file or directory: {}", .0.display())]
    NotFound(PathBuf),
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("remote operation failed: {0}")]
    Remote(#[from] NamespaceError),
    #[error("failed to close session: {0}")]
    Close(#[source] NamespaceError),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}
