//! TTL cache
//!
//! Key-agnostic cache-aside layer used to shield rate-limited upstream calls:
//! - `CacheBackend` port over a key-value store with native expiration
//! - `TtlCache` with get / set / delete / get_or_compute over JSON payloads
//! - Redis backend (lazy, timeout-bounded) and an in-memory backend
//!
//! The cache never fails its caller: backend outages turn reads into misses
//! and writes into logged no-ops.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use cache::{CacheKey, InMemoryBackend, TtlCache};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = TtlCache::new(Arc::new(InMemoryBackend::new()), Duration::from_secs(300));
//! let key = CacheKey::weather("Paris", "metric", "ru").build();
//!
//! let temp: Result<f64, String> = cache
//!     .get_or_compute(&key, None, || async { Ok(18.5) })
//!     .await;
//! assert_eq!(temp, Ok(18.5));
//! assert_eq!(cache.get::<f64>(&key).await, Some(18.5));
//! # }
//! ```

pub mod errors;
pub mod keys;
pub mod memory;
pub mod ports;
pub mod redis_backend;
pub mod ttl;

pub use errors::CacheError;
pub use keys::CacheKey;
pub use memory::InMemoryBackend;
pub use ports::CacheBackend;
pub use redis_backend::RedisBackend;
pub use ttl::TtlCache;
