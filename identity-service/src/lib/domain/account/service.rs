use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::TokenRejection;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::account::errors::AccountError;
use crate::domain::account::errors::UnauthenticatedReason;
use crate::domain::account::models::AccessGrant;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::AccountProfile;
use crate::domain::account::models::PasswordHash;
use crate::domain::account::models::Principal;
use crate::domain::account::models::RegisterAccountCommand;
use crate::domain::account::models::Username;
use crate::domain::account::ports::CredentialStore;
use crate::domain::account::ports::IdentityServicePort;

/// Domain service implementation for identity operations.
///
/// Concrete implementation of IdentityServicePort with dependency injection.
/// Password work runs on the blocking pool; every credential store call is
/// bounded by `store_timeout`.
pub struct IdentityService<CS>
where
    CS: CredentialStore,
{
    store: Arc<CS>,
    authenticator: Arc<Authenticator>,
    store_timeout: Duration,
}

impl<CS> IdentityService<CS>
where
    CS: CredentialStore,
{
    /// Create a new identity service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential store implementation
    /// * `authenticator` - Password and token primitives bound to the signing secret
    /// * `store_timeout` - Upper bound for each credential store call
    pub fn new(store: Arc<CS>, authenticator: Arc<Authenticator>, store_timeout: Duration) -> Self {
        Self {
            store,
            authenticator,
            store_timeout,
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, AccountError>>,
    ) -> Result<T, AccountError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "Credential store call timed out"
                );
                Err(AccountError::Unavailable(format!(
                    "credential store {} timed out",
                    operation
                )))
            }
        }
    }
}

#[async_trait]
impl<CS> IdentityServicePort for IdentityService<CS>
where
    CS: CredentialStore,
{
    async fn register(&self, command: RegisterAccountCommand) -> Result<AccountProfile, AccountError> {
        let taken = self
            .bounded(
                "exists_by_username_or_email",
                self.store
                    .exists_by_username_or_email(&command.username, &command.email),
            )
            .await?;
        if taken {
            tracing::info!(username = %command.username, "Registration rejected: username or email taken");
            return Err(AccountError::Conflict);
        }

        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;
        let password_hash =
            tokio::task::spawn_blocking(move || authenticator.hash_password(password.as_str()))
                .await
                .map_err(|e| AccountError::Unknown(format!("Password hashing task failed: {}", e)))?
                .map_err(|e| AccountError::Unknown(format!("Password hashing failed: {}", e)))?;

        let account = Account {
            id: AccountId::new(),
            username: command.username,
            email: command.email,
            full_name: command.full_name,
            password_hash: PasswordHash::new(password_hash),
            is_active: true,
            created_at: Utc::now(),
        };

        let created = self.bounded("insert", self.store.insert(account)).await?;
        tracing::info!(account_id = %created.id, username = %created.username, "Account registered");

        Ok(AccountProfile::from(&created))
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessGrant, AccountError> {
        // A username that cannot exist still pays for a verification below.
        let account = match Username::new(username.to_string()) {
            Ok(username) => {
                self.bounded("find_by_username", self.store.find_by_username(&username))
                    .await?
            }
            Err(_) => None,
        };

        let authenticator = Arc::clone(&self.authenticator);
        let password = password.to_string();
        let stored_hash = account
            .as_ref()
            .map(|account| account.password_hash.as_str().to_string());
        let subject = account
            .as_ref()
            .map(|account| account.username.as_str().to_string())
            .unwrap_or_default();

        let result = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, stored_hash.as_deref(), &subject, now)
        })
        .await
        .map_err(|e| AccountError::Unknown(format!("Password verification task failed: {}", e)))?;

        let authenticated = match result {
            Ok(authenticated) => authenticated,
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::info!("Login rejected: bad credentials");
                return Err(AccountError::BadCredentials);
            }
            Err(AuthenticationError::JwtError(e)) => {
                return Err(AccountError::Unknown(format!("Token generation failed: {}", e)));
            }
        };

        let account = account.ok_or(AccountError::BadCredentials)?;
        if !account.is_active {
            tracing::info!(account_id = %account.id, "Login rejected: account inactive");
            return Err(AccountError::Forbidden);
        }

        tracing::debug!(account_id = %account.id, "Access token issued");
        Ok(AccessGrant::bearer(
            authenticated.access_token,
            authenticated.expires_at,
        ))
    }

    async fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, AccountError> {
        let verified = self
            .authenticator
            .validate_token(token, now)
            .map_err(|rejection| {
                tracing::debug!(reason = %rejection, "Token rejected");
                AccountError::from(rejection)
            })?;

        let username = Username::new(verified.subject).map_err(|_| {
            AccountError::from(TokenRejection::Malformed(
                "subject is not a valid username".to_string(),
            ))
        })?;

        let account = self
            .bounded("find_by_username", self.store.find_by_username(&username))
            .await?
            .ok_or_else(|| {
                tracing::debug!(username = %username, "Token subject has no account");
                AccountError::Unauthenticated(UnauthenticatedReason::UnknownAccount)
            })?;

        if !account.is_active {
            tracing::info!(account_id = %account.id, "Token rejected: account inactive");
            return Err(AccountError::Forbidden);
        }

        Ok(Principal {
            account: AccountProfile::from(&account),
            token_expires_at: verified.expires_at,
        })
    }

    async fn deactivate(&self, username: &Username) -> Result<(), AccountError> {
        let updated = self
            .bounded("set_active", self.store.set_active(username, false))
            .await?;
        if !updated {
            return Err(AccountError::NotFound(username.to_string()));
        }

        tracing::info!(username = %username, "Account deactivated");
        Ok(())
    }
}
