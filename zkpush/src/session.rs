use tracing::{info, warn};
use zkpush_core::{Namespace, ZkNamespace};

use crate::config::SessionConfig;
use crate::sync::engine::SyncEngine;
use crate::sync::error::SyncError;

pub fn connect(config: &SessionConfig) -> Result<ZkNamespace, SyncError> {
    let namespace = ZkNamespace::connect(&config.connection_string, config.session_timeout)?;
    info!(
        connection_string = %config.connection_string,
        session_timeout_ms = config.session_timeout.as_millis() as u64,
        "zookeeper session opened"
    );
    Ok(namespace)
}

/// Runs `op` against `namespace` and closes it afterwards, whatever `op`
/// returned. An error from `op` takes precedence over a close failure.
pub fn run_scoped<N, T, F>(namespace: N, op: F) -> Result<T, SyncError>
where
    N: Namespace,
    F: FnOnce(&SyncEngine<N>) -> Result<T, SyncError>,
{
    let engine = SyncEngine::new(namespace);
    let result = op(&engine);
    match (result, engine.close()) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "session close failed after an earlier error");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use zkpush_core::MemoryNamespace;

    #[test]
    fn closes_after_success() {
        let memory = Arc::new(MemoryNamespace::new());
        let exists = run_scoped(memory.clone(), |engine| engine.exists("/a")).unwrap();
        assert!(!exists);
        assert!(memory.is_closed());
    }

    #[test]
    fn closes_after_failure() {
        let memory = Arc::new(MemoryNamespace::new());
        let err = run_scoped(memory.clone(), |engine| {
            engine.upload(std::path::Path::new("/definitely/not/here"), "/a")
        })
        .unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
        assert!(memory.is_closed());
    }

    #[test]
    fn close_failure_alone_is_reported() {
        let memory = Arc::new(MemoryNamespace::new());
        memory.fail_close();
        let err = run_scoped(memory.clone(), |engine| engine.delete("/a")).unwrap_err();
        assert!(matches!(err, SyncError::Close(_)));
    }

    #[test]
    fn operation_error_wins_over_close_failure() {
        let memory = Arc::new(MemoryNamespace::new());
        memory.fail_close();
        let err = run_scoped(memory.clone(), |engine| {
            engine.upload(std::path::Path::new("/definitely/not/here"), "/a")
        })
        .unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
        assert!(memory.is_closed());
    }
}
