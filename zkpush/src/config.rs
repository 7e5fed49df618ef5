use std::time::Duration;

use anyhow::Context;
use zkpush_core::DEFAULT_SESSION_TIMEOUT;

pub const CONNECTION_STRING_ENV: &str = "ZKPUSH_CONNECTION_STRING";
pub const SESSION_TIMEOUT_ENV: &str = "ZKPUSH_SESSION_TIMEOUT_MS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// `host:port[,host:port...][/chroot]`
    pub connection_string: String,
    pub session_timeout: Duration,
}

impl SessionConfig {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            session_timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }

    /// Flags win over the environment, which wins over defaults.
    pub fn resolve(
        connection_string: Option<String>,
        session_timeout_ms: Option<u64>,
    ) -> anyhow::Result<Self> {
        let connection_string = connection_string
            .or_else(|| std::env::var(CONNECTION_STRING_ENV).ok())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .with_context(|| {
                format!("no connection string: pass --connection-string or set {CONNECTION_STRING_ENV}")
            })?;
        let session_timeout = session_timeout_ms
            .filter(|value| *value > 0)
            .map(Duration::from_millis)
            .unwrap_or_else(|| {
                Duration::from_millis(read_u64_env(
                    SESSION_TIMEOUT_ENV,
                    DEFAULT_SESSION_TIMEOUT.as_millis() as u64,
                ))
            });

        Ok(Self {
            connection_string,
            session_timeout,
        })
    }
}

fn read_u64_env(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
