use std::sync::Arc;

use auth::Authenticator;
use auth::JwtError;
use auth::PasswordError;
use auth::PasswordHasher;
use auth::SigningSecret;
use cache::CacheError;
use cache::RedisBackend;
use cache::TtlCache;
use config::ConfigError;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::config::Config;
use crate::domain::account::service::IdentityService;
use crate::outbound::repositories::PostgresCredentialStore;

/// Conditions that stop the core from starting at all.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("No signing secret configured (set JWT__SECRET)")]
    MissingSigningSecret,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid password hashing cost: {0}")]
    InvalidPasswordCost(#[from] PasswordError),

    #[error("Invalid database configuration: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid cache configuration: {0}")]
    Cache(#[from] CacheError),
}

/// Wired identity core.
///
/// Connections are opened lazily, so building succeeds without the database
/// or Redis being reachable. A request layer owns the `Core` and drives it.
pub struct Core {
    pub identity: Arc<IdentityService<PostgresCredentialStore>>,
    pub credential_store: Arc<PostgresCredentialStore>,
    pub cache: Arc<TtlCache<RedisBackend>>,
}

impl Core {
    /// Assemble the identity service and cache from configuration.
    ///
    /// # Errors
    /// * `MissingSigningSecret` - No secret configured; the process must not serve
    /// * `InvalidPasswordCost` - Hashing parameters rejected by Argon2
    /// * `Database` / `Cache` - Connection URL could not be parsed
    pub fn build(config: &Config) -> Result<Self, StartupError> {
        let secret = config
            .jwt
            .secret
            .clone()
            .ok_or(StartupError::MissingSigningSecret)
            .and_then(|secret| {
                SigningSecret::new(secret).map_err(|e| match e {
                    JwtError::MissingSecret => StartupError::MissingSigningSecret,
                    other => StartupError::Config(ConfigError::Message(other.to_string())),
                })
            })
            .map_err(|e| {
                tracing::error!(error = %e, "Refusing to start");
                e
            })?;

        let password_hasher = PasswordHasher::with_cost(config.password.cost())?;
        let authenticator = Arc::new(Authenticator::new(
            &secret,
            password_hasher,
            config.jwt.token_ttl(),
        )?);
        tracing::info!(
            memory_kib = config.password.memory_kib,
            iterations = config.password.iterations,
            parallelism = config.password.parallelism,
            token_ttl_minutes = config.jwt.expiration_minutes,
            "Authenticator ready"
        );

        let pg_pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(config.database.timeout())
            .connect_lazy(&config.database.url)?;
        tracing::info!(
            max_connections = config.database.max_connections,
            database = "postgresql",
            "Database connection pool created"
        );

        let credential_store = Arc::new(PostgresCredentialStore::new(pg_pool));
        let identity = Arc::new(IdentityService::new(
            Arc::clone(&credential_store),
            authenticator,
            config.database.timeout(),
        ));

        let backend = Arc::new(RedisBackend::new(&config.redis.url, config.redis.timeout())?);
        let cache = Arc::new(TtlCache::new(backend, config.cache.default_ttl()));
        tracing::info!(
            default_ttl_seconds = config.cache.default_ttl_seconds,
            timeout_ms = config.redis.timeout_ms,
            "Cache backend configured"
        );

        Ok(Self {
            identity,
            credential_store,
            cache,
        })
    }

    /// Release the long-lived clients.
    ///
    /// Closes the database pool, then drops this handle on the cache so the
    /// Redis connection goes away with its last owner.
    pub async fn shutdown(self) {
        tracing::info!("Identity core shutting down");

        self.credential_store.close().await;
        tracing::info!(database = "postgresql", "Database connection pool closed");

        drop(self.identity);
        drop(self.cache);
        tracing::info!(cache = "redis", "Cache backend released");
    }
}
