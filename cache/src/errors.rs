use std::time::Duration;

use thiserror::Error;

/// Error type for cache backend operations.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Cache command failed: {0}")]
    CommandFailed(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache backend not connected, reconnect pending")]
    Reconnecting,
}
