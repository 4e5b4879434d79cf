//! Harmful-content text analysis.
//!
//! Scores a piece of text against the Content Safety harm categories (hate,
//! sexual, self-harm, violence) and reports a severity level per category,
//! plus any custom blocklist hits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use azure_content_safety_core::client::ContentSafetyClient;
//! use azure_content_safety::text_analysis::{self, AnalyzeTextRequest, TextCategory};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ContentSafetyClient::builder().build()?;
//!
//! let request = AnalyzeTextRequest::builder()
//!     .text("I want to punch a tree")
//!     .build();
//!
//! let result = text_analysis::analyze(&client, &request).await?;
//! if let Some(severity) = result.severity(TextCategory::Violence) {
//!     println!("Violence severity: {severity}");
//! }
//! # Ok(())
//! # }
//! ```

use azure_content_safety_core::client::ContentSafetyClient;
use azure_content_safety_core::error::SafetyResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{items, operation_path, ANALYZE_TEXT_API_VERSION, ANALYZE_TEXT_PATH};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A harm category the service can score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextCategory {
    Hate,
    Sexual,
    SelfHarm,
    Violence,
}

impl TextCategory {
    /// All categories, in the order the service documents them.
    pub const ALL: [TextCategory; 4] = [Self::Hate, Self::Sexual, Self::SelfHarm, Self::Violence];

    /// Returns the API string representation of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hate => "Hate",
            Self::Sexual => "Sexual",
            Self::SelfHarm => "SelfHarm",
            Self::Violence => "Violence",
        }
    }
}

/// Granularity of the returned severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalyzeTextOutputType {
    /// Severities 0, 2, 4, 6.
    #[default]
    FourSeverityLevels,
    /// Severities 0 through 7.
    EightSeverityLevels,
}

/// A request to analyze text for harmful content.
///
/// Fields are sent as-is; the service is the one that rejects bad values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTextRequest {
    pub text: String,
    pub categories: Vec<TextCategory>,
    pub blocklist_names: Vec<String>,
    pub halt_on_blocklist_hit: bool,
    pub output_type: AnalyzeTextOutputType,
}

impl AnalyzeTextRequest {
    /// Creates a new builder for a text analysis request.
    pub fn builder() -> AnalyzeTextRequestBuilder {
        AnalyzeTextRequestBuilder::default()
    }

    /// Categories as a comma-separated list, for tracing.
    pub(crate) fn categories_field(&self) -> String {
        self.categories
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Builder for [`AnalyzeTextRequest`].
///
/// Defaults: every category, no blocklists, halt on blocklist hit, four
/// severity levels.
#[derive(Debug, Default)]
pub struct AnalyzeTextRequestBuilder {
    text: Option<String>,
    categories: Option<Vec<TextCategory>>,
    blocklist_names: Vec<String>,
    halt_on_blocklist_hit: Option<bool>,
    output_type: AnalyzeTextOutputType,
}

impl AnalyzeTextRequestBuilder {
    /// Sets the text to analyze.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Restricts analysis to the given categories.
    pub fn categories(mut self, categories: Vec<TextCategory>) -> Self {
        self.categories = Some(categories);
        self
    }

    /// Adds a custom blocklist to match against.
    pub fn blocklist_name(mut self, name: impl Into<String>) -> Self {
        self.blocklist_names.push(name.into());
        self
    }

    /// Sets whether analysis stops once a blocklist matches.
    pub fn halt_on_blocklist_hit(mut self, halt: bool) -> Self {
        self.halt_on_blocklist_hit = Some(halt);
        self
    }

    /// Sets the severity granularity.
    pub fn output_type(mut self, output_type: AnalyzeTextOutputType) -> Self {
        self.output_type = output_type;
        self
    }

    /// Builds the request.
    pub fn build(self) -> AnalyzeTextRequest {
        AnalyzeTextRequest {
            text: self.text.unwrap_or_default(),
            categories: self
                .categories
                .unwrap_or_else(|| TextCategory::ALL.to_vec()),
            blocklist_names: self.blocklist_names,
            halt_on_blocklist_hit: self.halt_on_blocklist_hit.unwrap_or(true),
            output_type: self.output_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// The result of a text analysis request.
///
/// Holds the response body exactly as the service sent it; serializing the
/// result gives that body back. The accessors read from it leniently and
/// skip anything they do not recognize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalyzeTextResult {
    body: Value,
}

impl AnalyzeTextResult {
    /// The response body as received.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consumes the result, returning the response body.
    pub fn into_body(self) -> Value {
        self.body
    }

    /// One entry per analyzed category.
    pub fn categories_analysis(&self) -> Vec<TextCategoriesAnalysis> {
        items(&self.body, "categoriesAnalysis")
    }

    /// Blocklist hits, when blocklists were requested.
    pub fn blocklists_match(&self) -> Vec<TextBlocklistMatch> {
        items(&self.body, "blocklistsMatch")
    }

    /// Severity reported for a category, if it was analyzed.
    pub fn severity(&self, category: TextCategory) -> Option<u8> {
        self.categories_analysis()
            .into_iter()
            .find(|a| a.is(category))
            .and_then(|a| a.severity)
    }

    /// Highest severity across all categories (0 when nothing was reported).
    pub fn max_severity(&self) -> u8 {
        self.categories_analysis()
            .into_iter()
            .filter_map(|a| a.severity)
            .max()
            .unwrap_or(0)
    }
}

impl From<Value> for AnalyzeTextResult {
    fn from(body: Value) -> Self {
        Self { body }
    }
}

/// A blocklist item that matched the text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlocklistMatch {
    pub blocklist_name: String,
    pub blocklist_item_id: String,
    pub blocklist_item_text: String,
}

/// Severity for a single category.
///
/// `category` is kept as a string so categories added to the service later
/// are still visible.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextCategoriesAnalysis {
    pub category: String,
    #[serde(default)]
    pub severity: Option<u8>,
}

impl TextCategoriesAnalysis {
    /// Returns `true` if this entry is for `category`.
    pub fn is(&self, category: TextCategory) -> bool {
        self.category == category.as_str()
    }
}

// ---------------------------------------------------------------------------
// API functions
// ---------------------------------------------------------------------------

/// Analyze text for harmful content.
///
/// # Tracing
///
/// Emits a span named `content_safety::text::analyze` with field `categories`.
#[tracing::instrument(
    name = "content_safety::text::analyze",
    skip(client, request),
    fields(categories = %request.categories_field())
)]
pub async fn analyze(
    client: &ContentSafetyClient,
    request: &AnalyzeTextRequest,
) -> SafetyResult<AnalyzeTextResult> {
    tracing::debug!("analyzing text");

    let path = operation_path(ANALYZE_TEXT_PATH, ANALYZE_TEXT_API_VERSION);
    let result: AnalyzeTextResult = client.post(&path, request).await?;

    tracing::debug!(max_severity = result.max_severity(), "text analysis complete");
    Ok(result)
}
