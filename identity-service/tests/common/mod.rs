use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::Authenticator;
use auth::HashingCost;
use auth::PasswordHasher;
use auth::SigningSecret;
use identity_service::account::errors::AccountError;
use identity_service::account::models::Account;
use identity_service::account::models::EmailAddress;
use identity_service::account::models::NewPassword;
use identity_service::account::models::RegisterAccountCommand;
use identity_service::account::models::Username;
use identity_service::account::ports::CredentialStore;
use identity_service::account::service::IdentityService;
use tokio::sync::RwLock;

pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Credential store backed by a map keyed on username.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    accounts: RwLock<HashMap<String, Account>>,
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &Username) -> Result<Option<Account>, AccountError> {
        Ok(self.accounts.read().await.get(username.as_str()).cloned())
    }

    async fn insert(&self, account: Account) -> Result<Account, AccountError> {
        let mut accounts = self.accounts.write().await;
        let taken = accounts.values().any(|existing| {
            existing.username == account.username || existing.email == account.email
        });
        if taken {
            return Err(AccountError::Conflict);
        }
        accounts.insert(account.username.as_str().to_string(), account.clone());
        Ok(account)
    }

    async fn exists_by_username_or_email(
        &self,
        username: &Username,
        email: &EmailAddress,
    ) -> Result<bool, AccountError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .any(|existing| &existing.username == username || &existing.email == email))
    }

    async fn set_active(&self, username: &Username, is_active: bool) -> Result<bool, AccountError> {
        match self.accounts.write().await.get_mut(username.as_str()) {
            Some(account) => {
                account.is_active = is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Identity service wired with a cheap hasher and a fixed secret.
pub struct TestIdentity {
    pub service: IdentityService<InMemoryCredentialStore>,
    pub authenticator: Arc<Authenticator>,
}

impl TestIdentity {
    pub fn new() -> Self {
        let hasher = PasswordHasher::with_cost(HashingCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("Failed to build hasher");
        let secret = SigningSecret::new(TEST_SECRET).expect("Failed to build secret");
        let authenticator = Arc::new(
            Authenticator::new(&secret, hasher, chrono::Duration::minutes(30))
                .expect("Failed to build authenticator"),
        );

        let service = IdentityService::new(
            Arc::new(InMemoryCredentialStore::default()),
            Arc::clone(&authenticator),
            Duration::from_secs(2),
        );

        Self {
            service,
            authenticator,
        }
    }
}

pub fn register_command(username: &str, email: &str, password: &str) -> RegisterAccountCommand {
    RegisterAccountCommand::new(
        Username::new(username.to_string()).expect("Invalid username"),
        EmailAddress::new(email.to_string()).expect("Invalid email"),
        NewPassword::new(password.to_string()).expect("Invalid password"),
        None,
    )
}
