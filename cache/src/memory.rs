use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::errors::CacheError;
use crate::ports::CacheBackend;

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process backend with per-key expiration.
///
/// Expired entries are invisible to reads immediately and are physically
/// purged on the next write. Uses the tokio clock, so a paused test runtime
/// controls expiry.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries physically stored, expired ones included.
    pub async fn stored_len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn raw_get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();

        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn raw_set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            key.to_string(),
            StoredEntry {
                value,
                expires_at: now + Duration::from_secs(ttl_seconds),
            },
        );

        Ok(())
    }

    async fn raw_delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
