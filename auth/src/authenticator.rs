use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::IssuedToken;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::SigningSecret;
use crate::jwt::TokenRejection;
use crate::jwt::VerifiedToken;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and JWT generation.
///
/// Holds the process-wide signing keys and token lifetime. All methods are
/// synchronous; password work is CPU-bound and belongs on a blocking pool.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    token_ttl: Duration,
    dummy_hash: String,
}

/// Result of successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// JWT access token
    pub access_token: String,
    /// Absolute expiration of the access token
    pub expires_at: DateTime<Utc>,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// Hashes a throwaway password once so that logins for unknown accounts
    /// can spend the same work as a real verification.
    ///
    /// # Arguments
    /// * `secret` - Secret key for JWT signing
    /// * `password_hasher` - Hasher configured with the desired cost
    /// * `token_ttl` - Lifetime of issued access tokens
    ///
    /// # Errors
    /// * `PasswordError` - Hashing the placeholder password failed
    pub fn new(
        secret: &SigningSecret,
        password_hasher: PasswordHasher,
        token_ttl: Duration,
    ) -> Result<Self, PasswordError> {
        let dummy_hash = password_hasher.hash("placeholder-password-never-matches")?;

        Ok(Self {
            password_hasher,
            jwt_handler: JwtHandler::new(secret),
            token_ttl,
            dummy_hash,
        })
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a password against a stored hash.
    ///
    /// With no stored hash (unknown account) the password is checked against
    /// an internal placeholder and the result is always false.
    pub fn verify_password(&self, password: &str, stored_hash: Option<&str>) -> bool {
        match stored_hash {
            Some(hash) => self.password_hasher.verify(password, hash),
            None => {
                let _ = self.password_hasher.verify(password, &self.dummy_hash);
                false
            }
        }
    }

    /// Verify credentials and issue an access token for `subject`.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash, `None` when the account is unknown
    /// * `subject` - Username placed in the token's `sub` claim
    /// * `now` - Issuance instant
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match or account is unknown
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: Option<&str>,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.verify_password(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let issued = self.issue_token(subject, now)?;

        Ok(AuthenticationResult {
            access_token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Issue an access token without password verification.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_token(&self, subject: &str, now: DateTime<Utc>) -> Result<IssuedToken, JwtError> {
        self.jwt_handler.issue(subject, self.token_ttl, now)
    }

    /// Validate a bearer token at instant `now`.
    ///
    /// # Errors
    /// * `TokenRejection` - Signature, expiration or subject check failed
    pub fn validate_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedToken, TokenRejection> {
        self.jwt_handler.verify(token, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::HashingCost;

    fn authenticator() -> Authenticator {
        let hasher = PasswordHasher::with_cost(HashingCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let secret = SigningSecret::new("test_secret_key_at_least_32_bytes!").unwrap();

        Authenticator::new(&secret, hasher, Duration::minutes(30)).expect("Failed to build")
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = authenticator();
        let now = Utc::now();

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate("my_password", Some(&hash), "alice", now)
            .expect("Authentication failed");

        assert!(!result.access_token.is_empty());
        assert!(result.expires_at > now);

        let verified = authenticator
            .validate_token(&result.access_token, now)
            .expect("Token validation failed");
        assert_eq!(verified.subject, "alice");
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = authenticator();
        let hash = authenticator.hash_password("my_password").unwrap();

        let result = authenticator.authenticate("wrong_password", Some(&hash), "alice", Utc::now());
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_authenticate_unknown_account() {
        let authenticator = authenticator();

        // Even the placeholder's own password must not match.
        let result = authenticator.authenticate(
            "placeholder-password-never-matches",
            None,
            "ghost",
            Utc::now(),
        );
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_issue_and_validate_token() {
        let authenticator = authenticator();
        let now = Utc::now();

        let issued = authenticator.issue_token("alice", now).unwrap();
        assert_eq!(issued.expires_at.timestamp(), now.timestamp() + 30 * 60);

        let expired = authenticator.validate_token(&issued.token, now + Duration::minutes(31));
        assert_eq!(expired, Err(TokenRejection::Expired));
    }

    #[test]
    fn test_validate_invalid_token() {
        let result = authenticator().validate_token("invalid.token.here", Utc::now());
        assert!(result.is_err());
    }
}
