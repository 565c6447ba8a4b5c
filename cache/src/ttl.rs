use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

use crate::ports::CacheBackend;

type InflightMap = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// Outcome of one backend read.
enum Lookup<T> {
    Hit(T),
    Miss,
    Failed,
}

/// Cache-aside TTL cache over a [`CacheBackend`].
///
/// Values are stored as JSON. The cache is an optimization only: backend
/// failures are logged and turn reads into misses and writes into no-ops, so
/// callers never see a cache error.
///
/// Concurrent [`get_or_compute`](Self::get_or_compute) calls for the same key
/// inside one process are coalesced behind a per-key gate while the backend
/// answers. When it does not, every caller computes on its own without
/// waiting. Across processes duplicate computations may still happen and the
/// last write wins.
pub struct TtlCache<B>
where
    B: CacheBackend,
{
    backend: Arc<B>,
    default_ttl: Duration,
    inflight: InflightMap,
}

impl<B> TtlCache<B>
where
    B: CacheBackend,
{
    /// Create a new cache over a shared backend handle.
    ///
    /// # Arguments
    /// * `backend` - Backing key-value store
    /// * `default_ttl` - TTL applied when callers pass `None`
    pub fn new(backend: Arc<B>, default_ttl: Duration) -> Self {
        Self {
            backend,
            default_ttl,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up `key`.
    ///
    /// # Returns
    /// The cached value, or None on a miss, an expired entry, an undecodable
    /// payload, or a backend failure
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        match self.lookup(key).await {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::Failed => None,
        }
    }

    async fn lookup<T>(&self, key: &str) -> Lookup<T>
    where
        T: DeserializeOwned,
    {
        let raw = match self.backend.raw_get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key = %key, "Cache miss");
                return Lookup::Miss;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return Lookup::Failed;
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(value) => {
                tracing::debug!(key = %key, "Cache hit");
                Lookup::Hit(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cached payload could not be decoded");
                Lookup::Miss
            }
        }
    }

    /// Store `value` under `key`, overwriting any previous entry.
    ///
    /// Sub-second TTLs are rounded up to one second.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>)
    where
        T: Serialize,
    {
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Value could not be serialized for cache");
                return;
            }
        };
        let ttl_seconds = ttl.unwrap_or(self.default_ttl).as_secs().max(1);

        if let Err(e) = self.backend.raw_set(key, payload, ttl_seconds).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    /// Remove `key`.
    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.backend.raw_delete(key).await {
            tracing::warn!(key = %key, error = %e, "Cache delete failed");
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs at most once per call and is not invoked on a hit. Its
    /// error is returned as-is and nothing is cached.
    ///
    /// # Arguments
    /// * `key` - Cache key
    /// * `ttl` - Entry lifetime, `None` for the default TTL
    /// * `compute` - Produces the value on a miss
    ///
    /// # Errors
    /// * `E` - `compute` failed
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.lookup(key).await {
            Lookup::Hit(value) => return Ok(value),
            // Waiting on the gate cannot help while the backend is down.
            Lookup::Failed => return self.compute_and_store(key, ttl, compute).await,
            Lookup::Miss => {}
        }

        let slot = self.enter(key);
        let gate = slot.lock().await;

        // Another caller may have filled the entry while we waited.
        match self.lookup(key).await {
            Lookup::Hit(value) => Ok(value),
            Lookup::Miss => self.compute_and_store(key, ttl, compute).await,
            Lookup::Failed => {
                drop(gate);
                self.compute_and_store(key, ttl, compute).await
            }
        }
    }

    async fn compute_and_store<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = compute().await?;
        self.set(key, &value, ttl).await;

        Ok(value)
    }

    fn enter(&self, key: &str) -> InflightSlot<'_> {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        let gate = Arc::clone(inflight.entry(key.to_string()).or_default());

        InflightSlot {
            inflight: &self.inflight,
            key: key.to_string(),
            gate: Some(gate),
        }
    }

    #[cfg(test)]
    fn inflight_len(&self) -> usize {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Registration of one caller in a key's gate; the map entry is removed when
/// the last registration drops.
struct InflightSlot<'a> {
    inflight: &'a InflightMap,
    key: String,
    gate: Option<Arc<AsyncMutex<()>>>,
}

impl InflightSlot<'_> {
    async fn lock(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        match &self.gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        }
    }
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        drop(self.gate.take());

        let unused = inflight
            .get(&self.key)
            .map_or(false, |gate| Arc::strong_count(gate) == 1);
        if unused {
            inflight.remove(&self.key);
        }
    }
}
