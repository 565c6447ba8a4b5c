use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::AccessGrant;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountProfile;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::Principal;
use crate::domain::account::models::RegisterAccountCommand;
use crate::domain::account::models::Username;

/// Port for identity operations consumed by the request layer.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Register a new account.
    ///
    /// # Arguments
    /// * `command` - Validated command containing username, email, and password
    ///
    /// # Returns
    /// Profile of the created account (no password hash)
    ///
    /// # Errors
    /// * `Conflict` - Username or email is already registered
    /// * `Unavailable` - Credential store timed out
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterAccountCommand) -> Result<AccountProfile, AccountError>;

    /// Verify a username/password pair and issue an access token.
    ///
    /// # Arguments
    /// * `username` - Raw username as submitted
    /// * `password` - Plaintext password as submitted
    /// * `now` - Issuance instant
    ///
    /// # Errors
    /// * `BadCredentials` - Unknown username or wrong password (indistinguishable)
    /// * `Forbidden` - Credentials are correct but the account is inactive
    /// * `Unavailable` - Credential store timed out
    async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessGrant, AccountError>;

    /// Resolve a bearer token to the account it was issued for.
    ///
    /// # Arguments
    /// * `token` - Bearer token presented by the caller
    /// * `now` - Verification instant
    ///
    /// # Errors
    /// * `Unauthenticated` - Forged, expired or malformed token, or unknown account
    /// * `Forbidden` - Account is inactive
    /// * `Unavailable` - Credential store timed out
    async fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, AccountError>;

    /// Deactivate an account. Tokens already issued stop resolving.
    ///
    /// # Errors
    /// * `NotFound` - No account with this username
    /// * `Unavailable` - Credential store timed out
    async fn deactivate(&self, username: &Username) -> Result<(), AccountError>;
}

/// Durable account storage consumed by the identity core.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Retrieve account by username.
    ///
    /// # Returns
    /// Optional account entity (None if not found)
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_username(&self, username: &Username) -> Result<Option<Account>, AccountError>;

    /// Persist new account to storage.
    ///
    /// # Errors
    /// * `Conflict` - Username or email is already taken
    /// * `DatabaseError` - Database operation failed
    async fn insert(&self, account: Account) -> Result<Account, AccountError>;

    /// Check whether the username or the email is already registered.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn exists_by_username_or_email(
        &self,
        username: &Username,
        email: &EmailAddress,
    ) -> Result<bool, AccountError>;

    /// Flip the active flag of an account.
    ///
    /// # Returns
    /// True if an account was updated, false if none matched
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn set_active(&self, username: &Username, is_active: bool) -> Result<bool, AccountError>;
}
