// Model clients: trait-based abstraction for swappable text backends.
//
// The TextAnalyzer trait defines the interface. LocalTextClient talks to a
// small model behind an OpenAI-compatible endpoint (Ollama and friends);
// CloudTextClient talks to a hosted provider. Both return Option instead of
// Result: a None means "this backend produced nothing, try the next one",
// and the failure itself is already logged at the point it happened.

pub mod cloud;
pub mod local;
pub mod parse;
pub mod vision;
pub(crate) mod wire;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of user content is being scored. Selects the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Comment,
    Danmaku,
    Frame,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Comment => "comment",
            ContentType::Danmaku => "danmaku",
            ContentType::Frame => "frame",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which backend family produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Local,
    Cloud,
}

impl AnalysisSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisSource::Local => "local",
            AnalysisSource::Cloud => "cloud",
        }
    }
}

/// The structured outcome of scoring one piece of content.
///
/// `score`, `category`, and the flags are guaranteed (defaulted during
/// parsing if the model omitted them); `confidence` is best-effort. Small
/// local models frequently leave it out, and an absent confidence is
/// treated as grounds for escalation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Compliance score, 0 (worst) to 100 (clean), clamped during parsing
    pub score: f64,
    /// Broad policy category (e.g. "harassment", "spam", "clean")
    pub category: String,
    /// Short machine label for the specific finding
    pub label: String,
    /// One-sentence human-readable rationale from the model
    pub reason: String,
    /// Worth surfacing as a highlight (positive signal, comments only)
    pub is_highlight: bool,
    pub is_inappropriate: bool,
    /// Model's self-reported confidence in [0,1], if it supplied one
    pub confidence: Option<f64>,
    pub source: AnalysisSource,
    pub model_name: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Trait for scoring text content. Implementations are async because every
/// backend is an HTTP call.
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    /// Score one piece of content.
    ///
    /// Returns None (never an error) when the backend is disabled,
    /// the call failed or timed out, or the output could not be parsed.
    /// The caller moves on to the next backend in priority order.
    async fn predict(&self, content: &str, content_type: ContentType) -> Option<AnalysisResult>;
}
