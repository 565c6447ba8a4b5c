use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use redis::RedisResult;
use tokio::sync::OnceCell;
use tokio::time::Instant;

use crate::errors::CacheError;
use crate::ports::CacheBackend;

/// Pause between failed connection attempts.
const RECONNECT_COOLDOWN: Duration = Duration::from_secs(1);

/// Redis-backed cache store.
///
/// The connection is opened lazily on first use. Only one caller attempts it
/// at a time; everyone else fails fast with [`CacheError::Reconnecting`]
/// instead of queueing, and after a failed attempt no new one starts until
/// the cooldown has passed. Every command is bounded by `timeout`.
pub struct RedisBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    connecting: AtomicBool,
    retry_after: Mutex<Option<Instant>>,
    timeout: Duration,
}

/// Clears the in-progress flag even when the attempt is cancelled.
struct ConnectAttempt<'a>(&'a AtomicBool);

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RedisBackend {
    /// Create a backend for `url` without connecting.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (`redis://[:password@]host:port/db`)
    /// * `timeout` - Upper bound for connecting and for each command
    ///
    /// # Errors
    /// * `ConnectionFailed` - URL could not be parsed
    pub fn new(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            connecting: AtomicBool::new(false),
            retry_after: Mutex::new(None),
            timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        if let Some(manager) = self.connection.get() {
            return Ok(manager.clone());
        }

        let cooling_down = self
            .retry_after
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map_or(false, |retry_after| Instant::now() < retry_after);
        if cooling_down {
            return Err(CacheError::Reconnecting);
        }

        if self
            .connecting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CacheError::Reconnecting);
        }
        let _attempt = ConnectAttempt(&self.connecting);

        // The previous attempt may have finished between the checks above.
        if let Some(manager) = self.connection.get() {
            return Ok(manager.clone());
        }

        tracing::info!(cache = "redis", "Connecting to cache backend");
        let connected = tokio::time::timeout(
            self.timeout,
            ConnectionManager::new(self.client.clone()),
        )
        .await
        .map_err(|_| CacheError::Timeout(self.timeout))
        .and_then(|result| result.map_err(|e| CacheError::ConnectionFailed(e.to_string())));

        match connected {
            Ok(manager) => {
                tracing::info!(cache = "redis", "Cache backend connected");
                let _ = self.connection.set(manager.clone());
                Ok(manager)
            }
            Err(e) => {
                tracing::warn!(
                    cache = "redis",
                    error = %e,
                    cooldown_ms = RECONNECT_COOLDOWN.as_millis() as u64,
                    "Cache backend connection failed"
                );
                let mut retry_after = self
                    .retry_after
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                *retry_after = Some(Instant::now() + RECONNECT_COOLDOWN);
                Err(e)
            }
        }
    }

    async fn bounded<T>(
        &self,
        command: impl Future<Output = RedisResult<T>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.timeout, command)
            .await
            .map_err(|_| CacheError::Timeout(self.timeout))?
            .map_err(|e| CacheError::CommandFailed(e.to_string()))
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn raw_get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut connection = self.connection().await?;
        let value: Option<Vec<u8>> = self.bounded(connection.get(key)).await?;
        Ok(value)
    }

    async fn raw_set(&self, key: &str, value: Vec<u8>, ttl_seconds: u64) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        let mut command = redis::cmd("SET");
        command.arg(key).arg(value).arg("EX").arg(ttl_seconds);

        self.bounded(command.query_async::<_, ()>(&mut connection))
            .await
    }

    async fn raw_delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection().await?;
        let _: () = self.bounded(connection.del(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = RedisBackend::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(CacheError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error_not_a_panic() {
        // Port 1 on localhost refuses connections.
        let backend = RedisBackend::new("redis://127.0.0.1:1/", Duration::from_millis(500)).unwrap();

        assert!(backend.raw_get("weather:paris").await.is_err());
        assert!(backend.raw_set("weather:paris", b"{}".to_vec(), 300).await.is_err());
        assert!(backend.raw_delete("weather:paris").await.is_err());
    }

    #[tokio::test]
    async fn test_failed_connect_starts_cooldown() {
        let backend = RedisBackend::new("redis://127.0.0.1:1/", Duration::from_millis(500)).unwrap();

        let first = backend.raw_get("weather:paris").await;
        assert!(matches!(
            first,
            Err(CacheError::ConnectionFailed(_)) | Err(CacheError::Timeout(_))
        ));

        let started = std::time::Instant::now();
        let second = backend.raw_get("weather:london").await;
        assert!(matches!(second, Err(CacheError::Reconnecting)));
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_stalled_server_does_not_serialize_keys() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let accepted = tokio::spawn(async move {
            let mut sockets = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        });

        let backend = RedisBackend::new(
            &format!("redis://{}/", address),
            Duration::from_millis(300),
        )
        .unwrap();
        let keys: Vec<String> = (0..10).map(|i| format!("weather:city-{}", i)).collect();
        let started = std::time::Instant::now();

        let results =
            futures::future::join_all(keys.iter().map(|key| backend.raw_get(key))).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(results.iter().all(Result::is_err));
        assert!(results
            .iter()
            .any(|result| matches!(result, Err(CacheError::Reconnecting))));

        accepted.abort();
    }
}
