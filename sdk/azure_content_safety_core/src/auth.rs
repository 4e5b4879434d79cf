use crate::error::{SafetyError, SafetyResult};
use secrecy::{ExposeSecret, SecretString};

/// Environment variable holding the Content Safety subscription key.
pub const KEY_ENV_VAR: &str = "AZURE_CONTENT_SAFETY_KEY";

/// Header carrying the subscription key on every request.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Subscription key credential for the Content Safety API.
///
/// The key is immutable once created and is never printed by `Debug`.
#[derive(Clone)]
pub struct SafetyCredential {
    key: SecretString,
}

impl SafetyCredential {
    /// Create a credential from the `AZURE_CONTENT_SAFETY_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::ConfigMissing`] if the variable is unset or empty.
    pub fn from_env() -> SafetyResult<Self> {
        match std::env::var(KEY_ENV_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::subscription_key(key)),
            _ => Err(SafetyError::ConfigMissing(format!(
                "{KEY_ENV_VAR} environment variable not set. \
                 Create a .env file with {KEY_ENV_VAR}=your-key"
            ))),
        }
    }

    /// Create a credential from a subscription key.
    ///
    /// An empty key is accepted here and rejected when the client is built.
    pub fn subscription_key(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::from(key.into()),
        }
    }

    /// Returns `true` if the key is empty or whitespace.
    pub fn is_empty(&self) -> bool {
        self.key.expose_secret().trim().is_empty()
    }

    /// Resolve the credential to the subscription key header value.
    pub(crate) fn header_value(&self) -> &str {
        self.key.expose_secret()
    }
}

impl std::fmt::Debug for SafetyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SafetyCredential(****)")
    }
}
