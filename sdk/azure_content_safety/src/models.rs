//! Paths and API versions for the Content Safety text operations.
//!
//! Each operation is pinned to the API version it was written against.
//! Also holds the lenient readers the result types use to look into the
//! response body they keep.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Path of the groundedness detection operation.
pub(crate) const GROUNDEDNESS_PATH: &str = "/contentsafety/text:detectGroundedness";

/// API version query parameter for groundedness detection (preview only).
pub(crate) const GROUNDEDNESS_API_VERSION: &str = "api-version=2024-09-15-preview";

/// Path of the Prompt Shields operation.
pub(crate) const SHIELD_PROMPT_PATH: &str = "/contentsafety/text:shieldPrompt";

/// API version query parameter for Prompt Shields.
pub(crate) const SHIELD_PROMPT_API_VERSION: &str = "api-version=2024-09-01";

/// Path of the harmful-content text analysis operation.
pub(crate) const ANALYZE_TEXT_PATH: &str = "/contentsafety/text:analyze";

/// API version query parameter for text analysis.
pub(crate) const ANALYZE_TEXT_API_VERSION: &str = "api-version=2024-09-01";

/// Joins an operation path with its API version.
pub(crate) fn operation_path(path: &str, api_version: &str) -> String {
    format!("{path}?{api_version}")
}

/// Reads `body[name]` as `T`, or `None` if it is missing or has another shape.
pub(crate) fn field<T: DeserializeOwned>(body: &Value, name: &str) -> Option<T> {
    body.get(name).and_then(|v| T::deserialize(v).ok())
}

/// Reads the array `body[name]`, skipping entries that are not a `T`.
pub(crate) fn items<T: DeserializeOwned>(body: &Value, name: &str) -> Vec<T> {
    body.get(name)
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(|e| T::deserialize(e).ok()).collect())
        .unwrap_or_default()
}
