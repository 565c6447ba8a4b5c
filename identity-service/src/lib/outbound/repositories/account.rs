use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::migrate::MigrateError;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::PasswordHash;
use crate::domain::account::models::Username;
use crate::domain::account::ports::CredentialStore;

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Close the pool and wait for checked-out connections to be returned.
    ///
    /// Later calls fail with `Unavailable`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    full_name: Option<String>,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AccountError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId(row.id),
            username: Username::new(row.username)?,
            email: EmailAddress::new(row.email)?,
            full_name: row.full_name,
            password_hash: PasswordHash::new(row.password_hash),
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

fn store_error(e: sqlx::Error) -> AccountError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AccountError::Unavailable(e.to_string())
        }
        e => AccountError::DatabaseError(e.to_string()),
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_username(&self, username: &Username) -> Result<Option<Account>, AccountError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, email, full_name, password_hash, is_active, created_at
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.map(Account::try_from).transpose()
    }

    async fn insert(&self, account: Account) -> Result<Account, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, full_name, password_hash, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id.0)
        .bind(account.username.as_str())
        .bind(account.email.as_str())
        .bind(account.full_name.as_deref())
        .bind(account.password_hash.as_str())
        .bind(account.is_active)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    tracing::debug!(
                        constraint = db_err.constraint().unwrap_or("unknown"),
                        "Insert hit unique constraint"
                    );
                    return AccountError::Conflict;
                }
            }
            store_error(e)
        })?;

        Ok(account)
    }

    async fn exists_by_username_or_email(
        &self,
        username: &Username,
        email: &EmailAddress,
    ) -> Result<bool, AccountError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM accounts
                WHERE username = $1 OR email = $2
            )
            "#,
        )
        .bind(username.as_str())
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(exists)
    }

    async fn set_active(&self, username: &Username, is_active: bool) -> Result<bool, AccountError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET is_active = $2
            WHERE username = $1
            "#,
        )
        .bind(username.as_str())
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected() > 0)
    }
}
