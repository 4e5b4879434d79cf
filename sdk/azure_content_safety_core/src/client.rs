//! HTTP client for Azure Content Safety.
//!
//! This module provides [`ContentSafetyClient`], the transport every
//! capability call goes through. The client owns the endpoint, the
//! subscription key and the underlying `reqwest` client; it performs exactly
//! one POST per call and never retries.
//!
//! # Examples
//!
//! ## Explicit configuration
//! ```rust,no_run
//! use azure_content_safety_core::client::ContentSafetyClient;
//! use azure_content_safety_core::auth::SafetyCredential;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ContentSafetyClient::builder()
//!     .endpoint("https://your-resource.cognitiveservices.azure.com")
//!     .credential(SafetyCredential::subscription_key("your-key"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## From the environment
//! ```rust,no_run
//! use azure_content_safety_core::client::ContentSafetyClient;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads AZURE_CONTENT_SAFETY_KEY and, optionally, AZURE_CONTENT_SAFETY_ENDPOINT.
//! let client = ContentSafetyClient::builder().build()?;
//! # Ok(())
//! # }
//! ```

use crate::auth::{SafetyCredential, SUBSCRIPTION_KEY_HEADER};
use crate::error::{SafetyError, SafetyResult};
use reqwest::header::HeaderValue;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use std::time::Duration;

/// Default Content Safety endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://contentsafetyeastus1.cognitiveservices.azure.com";

/// Environment variable overriding the endpoint.
pub const ENDPOINT_ENV_VAR: &str = "AZURE_CONTENT_SAFETY_ENDPOINT";

/// The base client for calling the Azure Content Safety API.
///
/// Holds only read-only state, so it is cheaply cloneable and can be shared
/// across tasks. Idle connections are not pooled: every call opens its own
/// connection and closes it once the response has been read.
#[derive(Debug, Clone)]
pub struct ContentSafetyClient {
    pub(crate) http: HttpClient,
    pub(crate) endpoint: Url,
    pub(crate) credential: SafetyCredential,
    /// Subscription key header, validated and marked sensitive at build time.
    pub(crate) key_header: HeaderValue,
}

/// Builder for constructing a [`ContentSafetyClient`].
///
/// Use [`ContentSafetyClient::builder()`] to create a new builder.
#[derive(Debug, Default)]
pub struct ContentSafetyClientBuilder {
    endpoint: Option<String>,
    credential: Option<SafetyCredential>,
    http_client: Option<HttpClient>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
}

impl ContentSafetyClient {
    /// Create a new builder for configuring a `ContentSafetyClient`.
    pub fn builder() -> ContentSafetyClientBuilder {
        ContentSafetyClientBuilder::default()
    }

    /// Get the base endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build a full URL for an API path (which may carry a query string).
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined to the endpoint URL.
    pub fn url(&self, path: &str) -> SafetyResult<Url> {
        self.endpoint
            .join(path)
            .map_err(|e| SafetyError::InvalidEndpoint(format!("failed to construct URL: {e}")))
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    ///
    /// Adds the subscription key header; `reqwest` sets
    /// `Content-Type: application/json`. Only status 200 counts as success.
    /// The response body is read in full before it is decoded, so a body that
    /// is not valid JSON surfaces as [`SafetyError::Decode`].
    ///
    /// Pass `serde_json::Value` as `R` to get the body back untouched.
    ///
    /// # Errors
    ///
    /// - [`SafetyError::Transport`] if the request could not be sent or the body not read
    /// - [`SafetyError::HttpStatus`] for any status other than 200
    /// - [`SafetyError::Decode`] if the body does not decode as `R`
    pub async fn post<B, R>(&self, path: &str, body: &B) -> SafetyResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path)?;

        tracing::debug!(url = %url, "sending request");

        let response = self
            .http
            .post(url)
            .header(SUBSCRIPTION_KEY_HEADER, self.key_header.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        // Consumes the response; the connection is released here or on the error path.
        let text = response.text().await?;

        if status != StatusCode::OK {
            return Err(SafetyError::http_status(
                status.as_u16(),
                self.truncate_message(&text),
            ));
        }

        let decoded = serde_json::from_str(&text)?;
        tracing::debug!(status = status.as_u16(), "request succeeded");
        Ok(decoded)
    }

    /// Maximum length for error bodies kept in diagnostics.
    const MAX_ERROR_MESSAGE_LEN: usize = 1000;

    /// Remove the subscription key from a message, in case the service echoes it.
    pub(crate) fn sanitize_error_message(&self, msg: &str) -> String {
        let key = self.credential.header_value();
        if key.is_empty() {
            msg.to_string()
        } else {
            msg.replace(key, "[REDACTED]")
        }
    }

    /// Sanitize a message and truncate it if it exceeds the maximum length.
    pub(crate) fn truncate_message(&self, msg: &str) -> String {
        let sanitized = self.sanitize_error_message(msg);

        if sanitized.len() > Self::MAX_ERROR_MESSAGE_LEN {
            let mut end = Self::MAX_ERROR_MESSAGE_LEN;
            while !sanitized.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated)", &sanitized[..end])
        } else {
            sanitized
        }
    }
}

/// Parse an endpoint, accepting a bare host name as `https://<host>`.
fn parse_endpoint(endpoint: &str) -> SafetyResult<Url> {
    let trimmed = endpoint.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    Url::parse(&with_scheme)
        .map_err(|e| SafetyError::InvalidEndpoint(format!("invalid endpoint URL '{trimmed}': {e}")))
}

impl ContentSafetyClientBuilder {
    /// Set the Content Safety endpoint.
    ///
    /// Either a full URL (`https://<resource>.cognitiveservices.azure.com`) or
    /// a bare host name. If not set, the builder checks the
    /// `AZURE_CONTENT_SAFETY_ENDPOINT` environment variable and then falls
    /// back to [`DEFAULT_ENDPOINT`].
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the credential to use for authentication.
    ///
    /// If not set, the builder uses [`SafetyCredential::from_env()`].
    pub fn credential(mut self, credential: SafetyCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Set a custom HTTP client.
    ///
    /// **Note:** timeouts set on this builder are ignored when a custom
    /// client is provided, and so is the no-idle-pool default.
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the connection timeout. No timeout is applied unless set.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the timeout for the whole request/response cycle. No timeout is
    /// applied unless set.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Build the `ContentSafetyClient`.
    ///
    /// No network I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No credential is provided and `AZURE_CONTENT_SAFETY_KEY` is unset or empty
    /// - The provided subscription key is empty
    /// - The subscription key contains characters not allowed in an HTTP header
    /// - The endpoint URL is invalid
    /// - The HTTP client cannot be initialized
    pub fn build(self) -> SafetyResult<ContentSafetyClient> {
        let credential = self
            .credential
            .map(Ok)
            .unwrap_or_else(SafetyCredential::from_env)?;

        if credential.is_empty() {
            return Err(SafetyError::ConfigMissing(
                "subscription key is empty".into(),
            ));
        }

        let mut key_header = HeaderValue::from_str(credential.header_value()).map_err(|_| {
            SafetyError::ConfigMissing(
                "subscription key contains characters not allowed in an HTTP header".into(),
            )
        })?;
        key_header.set_sensitive(true);

        let endpoint_str = self
            .endpoint
            .or_else(|| std::env::var(ENDPOINT_ENV_VAR).ok())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = parse_endpoint(&endpoint_str)?;

        let http = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = HttpClient::builder().pool_max_idle_per_host(0);
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                if let Some(timeout) = self.read_timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(ContentSafetyClient {
            http,
            endpoint,
            credential,
            key_header,
        })
    }
}
