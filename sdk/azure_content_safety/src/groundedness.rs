//! Groundedness detection.
//!
//! Checks whether a generated text (a summary, or an answer to a question) is
//! supported by the grounding sources it was generated from, and reports the
//! spans that are not.
//!
//! ## Example
//!
//! ```rust,no_run
//! use azure_content_safety_core::client::ContentSafetyClient;
//! use azure_content_safety::groundedness::{self, GroundednessRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ContentSafetyClient::builder().build()?;
//!
//! let request = GroundednessRequest::builder()
//!     .query("How many jobs did Homer Simpson do so far in the Simpsons?")
//!     .text("Over 150+!")
//!     .grounding_source("Homer Simpson is a character in the Simpsons, who has undertaken several roles in the show.")
//!     .build();
//!
//! let result = groundedness::detect(&client, &request).await?;
//! let percentage = result.ungrounded_percentage().unwrap_or(0.0) * 100.0;
//! println!("ungrounded: {} ({percentage:.0}%)", result.ungrounded_detected());
//! # Ok(())
//! # }
//! ```

use azure_content_safety_core::client::ContentSafetyClient;
use azure_content_safety_core::error::SafetyResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{
    field, items, operation_path, GROUNDEDNESS_API_VERSION, GROUNDEDNESS_PATH,
};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Domain of the text being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroundednessDomain {
    #[default]
    Generic,
    Medical,
}

/// Kind of generation the text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroundednessTask {
    Summarization,
    QnA,
}

/// The question the checked text answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QnaOptions {
    pub query: String,
}

/// A request to check a text against its grounding sources.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundednessRequest {
    pub domain: GroundednessDomain,
    pub task: GroundednessTask,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qna: Option<QnaOptions>,
    pub text: String,
    pub grounding_sources: Vec<String>,
    pub reasoning: bool,
}

impl GroundednessRequest {
    /// Creates a new builder for a groundedness request.
    pub fn builder() -> GroundednessRequestBuilder {
        GroundednessRequestBuilder::default()
    }
}

/// Builder for [`GroundednessRequest`].
///
/// The task defaults to `QnA` when a query is set and `Summarization`
/// otherwise. Domain defaults to `Generic`, reasoning to `false`.
#[derive(Debug, Default)]
pub struct GroundednessRequestBuilder {
    domain: GroundednessDomain,
    task: Option<GroundednessTask>,
    query: Option<String>,
    text: Option<String>,
    grounding_sources: Vec<String>,
    reasoning: bool,
}

impl GroundednessRequestBuilder {
    /// Sets the domain.
    pub fn domain(mut self, domain: GroundednessDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Sets the task explicitly.
    pub fn task(mut self, task: GroundednessTask) -> Self {
        self.task = Some(task);
        self
    }

    /// Sets the question the text answers.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Sets the generated text to check.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Adds one grounding source.
    pub fn grounding_source(mut self, source: impl Into<String>) -> Self {
        self.grounding_sources.push(source.into());
        self
    }

    /// Replaces the grounding sources.
    pub fn grounding_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grounding_sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Asks the service to explain why spans are ungrounded.
    ///
    /// The service only honors this when an Azure OpenAI resource is attached
    /// to the Content Safety resource.
    pub fn reasoning(mut self, reasoning: bool) -> Self {
        self.reasoning = reasoning;
        self
    }

    /// Builds the request.
    pub fn build(self) -> GroundednessRequest {
        let task = self.task.unwrap_or(if self.query.is_some() {
            GroundednessTask::QnA
        } else {
            GroundednessTask::Summarization
        });

        GroundednessRequest {
            domain: self.domain,
            task,
            qna: self.query.map(|query| QnaOptions { query }),
            text: self.text.unwrap_or_default(),
            grounding_sources: self.grounding_sources,
            reasoning: self.reasoning,
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// The result of a groundedness request.
///
/// Keeps the response body as received; serializing it reproduces the body
/// exactly, numbers included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundednessResult {
    body: Value,
}

impl GroundednessResult {
    /// The response body as received.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consumes the result, returning the response body.
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Whether any part of the text is ungrounded.
    pub fn ungrounded_detected(&self) -> bool {
        field(&self.body, "ungroundedDetected").unwrap_or(false)
    }

    /// Share of the text that is ungrounded, 0.0 to 1.0.
    pub fn ungrounded_percentage(&self) -> Option<f64> {
        field(&self.body, "ungroundedPercentage")
    }

    /// The ungrounded spans.
    pub fn ungrounded_details(&self) -> Vec<UngroundedDetail> {
        items(&self.body, "ungroundedDetails")
    }
}

impl From<Value> for GroundednessResult {
    fn from(body: Value) -> Self {
        Self { body }
    }
}

/// An ungrounded span of the checked text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UngroundedDetail {
    pub text: String,
    #[serde(default)]
    pub offset: Option<IndexDetails>,
    #[serde(default)]
    pub length: Option<IndexDetails>,
    /// Only present when reasoning was requested.
    #[serde(default)]
    pub reason: Option<String>,
}

/// A position or length in the three encodings the service reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDetails {
    pub utf8: u32,
    pub utf16: u32,
    pub code_point: u32,
}

// ---------------------------------------------------------------------------
// API functions
// ---------------------------------------------------------------------------

/// Check a text against its grounding sources.
///
/// # Tracing
///
/// Emits a span named `content_safety::text::detect_groundedness` with
/// fields `task` and `sources`.
#[tracing::instrument(
    name = "content_safety::text::detect_groundedness",
    skip(client, request),
    fields(task = ?request.task, sources = request.grounding_sources.len())
)]
pub async fn detect(
    client: &ContentSafetyClient,
    request: &GroundednessRequest,
) -> SafetyResult<GroundednessResult> {
    tracing::debug!("detecting groundedness");

    let path = operation_path(GROUNDEDNESS_PATH, GROUNDEDNESS_API_VERSION);
    let result: GroundednessResult = client.post(&path, request).await?;

    tracing::debug!(
        ungrounded = result.ungrounded_detected(),
        details = result.ungrounded_details().len(),
        "groundedness detection complete"
    );
    Ok(result)
}
