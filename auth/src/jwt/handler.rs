use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;
use jsonwebtoken::crypto;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Serialize;

use super::claims::Claims;
use super::errors::JwtError;
use super::errors::TokenRejection;
use super::secret::SigningSecret;

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Identity extracted from an accepted token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT token handler for issuing and verifying access tokens.
///
/// Tokens are compact JWS values signed with HS256 (HMAC with SHA-256), so any
/// conforming JWT library holding the same secret can read them.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler bound to the process signing secret.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Keys are derived once here; the secret is never re-read at call time
    pub fn new(secret: &SigningSecret) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
        }
    }

    /// Encode claims into a signed JWT.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Issue an access token for `subject`, expiring at `now + ttl`.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn issue(
        &self,
        subject: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let claims = Claims::for_subject(subject, now, ttl);
        let expires_at = claims
            .exp
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
            .ok_or_else(|| JwtError::EncodingFailed("expiration out of range".to_string()))?;

        let token = self.encode(&claims)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token at instant `now`.
    ///
    /// The HMAC over `header.payload` is checked before any segment is
    /// decoded; only then are expiration and subject read.
    ///
    /// # Errors
    /// * `BadSignature` - Signature does not match this handler's secret
    /// * `Expired` - `now` is at or past the `exp` claim
    /// * `Malformed` - Token is not a three-segment JWS, or lacks `exp`/`sub`
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken, TokenRejection> {
        let (message, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| TokenRejection::Malformed("expected three segments".to_string()))?;
        if message.split('.').count() != 2 {
            return Err(TokenRejection::Malformed(
                "expected three segments".to_string(),
            ));
        }

        let signature_valid =
            crypto::verify(signature, message.as_bytes(), &self.decoding_key, self.algorithm)
                .unwrap_or(false);
        if !signature_valid {
            return Err(TokenRejection::BadSignature);
        }

        let claims = self.decode_claims(token)?;

        let exp = claims
            .exp
            .ok_or_else(|| TokenRejection::Malformed("missing exp claim".to_string()))?;
        if claims.is_expired(now.timestamp()) {
            return Err(TokenRejection::Expired);
        }
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| TokenRejection::Malformed("exp claim out of range".to_string()))?;

        let subject = claims
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or_else(|| TokenRejection::Malformed("missing sub claim".to_string()))?;

        Ok(VerifiedToken {
            subject,
            expires_at,
        })
    }

    /// Decode the claims of a token whose signature was already checked.
    ///
    /// Time-based validation is disabled here: expiration is evaluated against
    /// the caller's clock in [`verify`](Self::verify).
    fn decode_claims(&self, token: &str) -> Result<Claims, TokenRejection> {
        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenRejection::Malformed(e.to_string()))
    }
}
