use async_trait::async_trait;

use crate::errors::CacheError;

/// Key-value store with native per-key expiration.
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Read raw bytes stored under `key`.
    ///
    /// # Returns
    /// Stored bytes, or None when the key is absent or its TTL has elapsed
    ///
    /// # Errors
    /// * `CacheError` - Backend is unreachable or the command failed
    async fn raw_get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store raw bytes under `key`, replacing any previous value.
    ///
    /// # Arguments
    /// * `key` - Cache key
    /// * `value` - Serialized payload
    /// * `ttl_seconds` - Seconds until the entry expires (at least 1)
    ///
    /// # Errors
    /// * `CacheError` - Backend is unreachable or the command failed
    async fn raw_set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<(), CacheError>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    /// * `CacheError` - Backend is unreachable or the command failed
    async fn raw_delete(&self, key: &str) -> Result<(), CacheError>;
}
