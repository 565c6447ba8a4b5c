use secrecy::ExposeSecret;
use secrecy::SecretString;

use super::errors::JwtError;

/// Process-wide HMAC signing secret.
///
/// Loaded once at startup and handed to [`JwtHandler`](super::JwtHandler) at
/// construction. Redacted from `Debug` output.
#[derive(Debug)]
pub struct SigningSecret(SecretString);

impl SigningSecret {
    /// Wrap a configured secret.
    ///
    /// # Errors
    /// * `MissingSecret` - The secret is empty or whitespace only
    pub fn new(secret: impl Into<String>) -> Result<Self, JwtError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(JwtError::MissingSecret);
        }
        Ok(Self(SecretString::from(secret)))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }
}
