use thiserror::Error;

/// Errors that can occur when calling the Azure Content Safety API.
///
/// The set is closed: every failure of a call lands in exactly one variant.
/// Callers that only care whether a result exists can collapse any of them
/// with [`OrAbsent::or_absent`].
#[derive(Error, Debug)]
pub enum SafetyError {
    /// A required configuration value (usually the subscription key) is missing or empty.
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    /// The endpoint URL is invalid.
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// The service answered with a status other than 200.
    #[error("HTTP error: {status} - {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body was not the JSON we expected.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request failed at the transport level (DNS, TLS, connection reset).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SafetyError {
    /// Create an HTTP status error.
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for errors detected before any network call was made.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigMissing(_) | Self::InvalidEndpoint(_))
    }

    /// The HTTP status code, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for Content Safety operations.
pub type SafetyResult<T> = std::result::Result<T, SafetyError>;

/// Collapse a [`SafetyResult`] into "result or nothing".
///
/// The error is not thrown away silently: it is logged through `tracing`
/// before `None` is returned, so a human can still see why there was no
/// result.
pub trait OrAbsent<T> {
    /// Returns the success value, or logs the failure and returns `None`.
    fn or_absent(self) -> Option<T>;
}

impl<T> OrAbsent<T> for SafetyResult<T> {
    fn or_absent(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                log_failure(&err);
                None
            }
        }
    }
}

fn log_failure(err: &SafetyError) {
    match err {
        SafetyError::ConfigMissing(message) => {
            tracing::error!(kind = "config", "{message}");
        }
        SafetyError::InvalidEndpoint(message) => {
            tracing::error!(kind = "config", "invalid endpoint: {message}");
        }
        SafetyError::HttpStatus { status, body } => {
            tracing::warn!(kind = "http_status", status, body = %body, "API returned status {status}");
        }
        SafetyError::Decode(e) => {
            tracing::warn!(kind = "decode", "error decoding JSON response: {e}");
        }
        SafetyError::Transport(e) => {
            tracing::warn!(kind = "transport", "request failed: {e}");
        }
    }
}
