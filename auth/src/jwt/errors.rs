use thiserror::Error;

/// Error type for JWT operations.
#[derive(Debug, Clone, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Signing secret is missing or empty")]
    MissingSecret,
}

/// Reason a presented token was not accepted.
///
/// Checks run in this order: signature, expiration, subject. A token that
/// fails the signature check is never decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenRejection {
    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token is expired")]
    Expired,

    #[error("Token is malformed: {0}")]
    Malformed(String),
}
