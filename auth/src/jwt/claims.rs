use std::collections::HashMap;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Access token claims.
///
/// Standard RFC 7519 registered claims used by this service plus any other
/// claims carried through the `extra` map. `exp` is an absolute Unix
/// timestamp so verification never needs the issuance time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (username)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Additional claims (flattened into token)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Create new empty claims.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create claims for an access token.
    ///
    /// # Arguments
    /// * `subject` - Username the token is issued to
    /// * `issued_at` - Issuance instant
    /// * `ttl` - Lifetime of the token
    ///
    /// # Returns
    /// Claims with sub, iat, and exp = issued_at + ttl set
    pub fn for_subject(subject: impl ToString, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = issued_at.timestamp();

        Self {
            sub: Some(subject.to_string()),
            exp: Some(iat + ttl.num_seconds()),
            iat: Some(iat),
            extra: HashMap::new(),
        }
    }

    /// Set subject.
    pub fn with_subject(mut self, sub: impl ToString) -> Self {
        self.sub = Some(sub.to_string());
        self
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// Set issued at (Unix timestamp).
    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Add a custom claim.
    pub fn with_extra(mut self, key: impl ToString, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), json_value);
        }
        self
    }

    /// Check if the token is expired at `current_timestamp`.
    ///
    /// A token expires at the instant `exp` is reached. Claims without `exp`
    /// are treated as expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp.map_or(true, |exp| current_timestamp >= exp)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_new_claims() {
        let claims = Claims::new().with_subject("alice");
        assert_eq!(claims.sub, Some("alice".to_string()));
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_for_subject() {
        let issued_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let claims = Claims::for_subject("alice", issued_at, Duration::minutes(30));

        assert_eq!(claims.sub, Some("alice".to_string()));
        assert_eq!(claims.iat, Some(issued_at.timestamp()));
        assert_eq!(claims.exp, Some(issued_at.timestamp() + 30 * 60));
    }

    #[test]
    fn test_builder_pattern() {
        let claims = Claims::new()
            .with_subject("alice")
            .with_expiration(1234567890)
            .with_issued_at(1234567800)
            .with_extra("jti", "token-1");

        assert_eq!(claims.sub, Some("alice".to_string()));
        assert_eq!(claims.exp, Some(1234567890));
        assert_eq!(claims.iat, Some(1234567800));
        assert_eq!(claims.extra.get("jti").unwrap().as_str(), Some("token-1"));
    }

    #[test]
    fn test_is_expired() {
        let claims = Claims::new().with_expiration(1000);

        assert!(!claims.is_expired(999));
        assert!(claims.is_expired(1000)); // Exactly at expiration
        assert!(claims.is_expired(1001));
    }

    #[test]
    fn test_is_expired_no_exp_claim() {
        assert!(Claims::new().is_expired(0));
    }

    #[test]
    fn test_serialization_omits_absent_claims() {
        let json = serde_json::to_value(Claims::new().with_subject("alice")).unwrap();

        assert_eq!(json, serde_json::json!({ "sub": "alice" }));
    }
}
