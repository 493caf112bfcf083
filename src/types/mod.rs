use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Gap entry written into the fallback record when model output cannot be parsed.
pub const FALLBACK_GAP_MESSAGE: &str = "Failed to generate research data due to an error.";

// ============= Pipeline Data Types =============

/// A single ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
}

/// Article text extracted from one URL.
///
/// `content` is the full extracted text; prompts clip it, capture never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedDocument {
    pub url: String,
    pub title: String,
    pub content: String,
}

/// One cited source inside a [`ResearchRecord`].
///
/// Only `url` is required; whatever else the model attached to a source
/// (summary, key points, credibility notes) is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Thematic consistency, conflicts and uncertainty across sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSummary {
    #[serde(default)]
    pub consistent_themes: Vec<String>,
    #[serde(default)]
    pub differences_or_conflicts: Vec<String>,
    #[serde(default)]
    pub gaps_or_uncertainties: Vec<String>,
}

/// Structured output of the research stage.
///
/// The field names are a stable contract for persistence and API layers.
/// Additional top-level keys produced by the model are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub query: String,
    pub sources: Vec<ResearchSource>,
    pub coverage_summary: CoverageSummary,
    pub completed_at_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResearchRecord {
    /// Minimal valid record used when the model output is unusable.
    pub fn fallback(query: &str, reason: impl Into<String>) -> Self {
        Self {
            query: query.to_string(),
            sources: Vec::new(),
            coverage_summary: CoverageSummary {
                consistent_themes: Vec::new(),
                differences_or_conflicts: Vec::new(),
                gaps_or_uncertainties: vec![FALLBACK_GAP_MESSAGE.to_string()],
            },
            completed_at_utc: Utc::now(),
            error: Some(reason.into()),
            extra: Map::new(),
        }
    }
}

/// Result of a full run: the answer plus the research it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchOutput {
    pub final_answer: String,
    pub research_data: ResearchRecord,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures reported by a remote search or generative backend.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, AppError::LLM(_) | AppError::Search(_))
    }
}

impl From<crate::utils::toml_config::ConfigError> for AppError {
    fn from(err: crate::utils::toml_config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
