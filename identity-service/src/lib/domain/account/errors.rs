use auth::TokenRejection;
use thiserror::Error;

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for registration password rules
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters")]
    TooShort { min: usize },
}

/// Why a request could not be tied to an account.
///
/// Kept for logs and tests only. The outward message of
/// [`AccountError::Unauthenticated`] is the same for every reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    Token(TokenRejection),
    UnknownAccount,
}

/// Top-level error for all account operations
#[derive(Debug, Clone, Error)]
pub enum AccountError {
    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordPolicyError),

    // Domain-level errors
    #[error("Incorrect username or password")]
    BadCredentials,

    #[error("Could not validate credentials")]
    Unauthenticated(UnauthenticatedReason),

    #[error("Inactive account")]
    Forbidden,

    #[error("Username or email already exists")]
    Conflict,

    #[error("Account not found: {0}")]
    NotFound(String),

    // Infrastructure errors
    #[error("Dependency unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AccountError {
    /// Whether the collaborator layer may retry the call with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccountError::Unavailable(_))
    }
}

impl From<TokenRejection> for AccountError {
    fn from(rejection: TokenRejection) -> Self {
        AccountError::Unauthenticated(UnauthenticatedReason::Token(rejection))
    }
}
