//! Credential primitives
//!
//! Provides the hashing and token building blocks of the identity core:
//! - Password hashing (Argon2id, tunable cost, constant-time verification)
//! - HS256 access tokens with absolute expiration, verified signature-first
//! - Authentication coordination
//!
//! Services define their own account model and ports and adapt these
//! implementations; nothing here touches storage.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other_password", &hash));
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth::{JwtHandler, SigningSecret, TokenRejection};
//! use chrono::{Duration, Utc};
//!
//! let secret = SigningSecret::new("secret_key_at_least_32_bytes_long!").unwrap();
//! let handler = JwtHandler::new(&secret);
//! let now = Utc::now();
//!
//! let issued = handler.issue("alice", Duration::minutes(30), now).unwrap();
//! assert_eq!(handler.verify(&issued.token, now).unwrap().subject, "alice");
//! assert_eq!(
//!     handler.verify(&issued.token, now + Duration::minutes(31)),
//!     Err(TokenRejection::Expired)
//! );
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, PasswordHasher, SigningSecret};
//! use chrono::{Duration, Utc};
//!
//! let secret = SigningSecret::new("secret_key_at_least_32_bytes_long!").unwrap();
//! let auth = Authenticator::new(&secret, PasswordHasher::new(), Duration::minutes(30)).unwrap();
//!
//! // Register: hash password
//! let hash = auth.hash_password("password123").unwrap();
//!
//! // Login: verify and issue token
//! let result = auth
//!     .authenticate("password123", Some(&hash), "alice", Utc::now())
//!     .unwrap();
//!
//! // Validate token
//! let verified = auth.validate_token(&result.access_token, Utc::now()).unwrap();
//! assert_eq!(verified.subject, "alice");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::IssuedToken;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::SigningSecret;
pub use jwt::TokenRejection;
pub use jwt::VerifiedToken;
pub use password::HashingCost;
pub use password::PasswordError;
pub use password::PasswordHasher;
