//! Structured research generation
//!
//! The model is asked for a JSON research record, but its reply is untrusted
//! text. [`parse_research_response`] turns that text into a
//! [`ResearchOutcome`]: either the parsed record, or the fallback record when
//! the reply is not a usable JSON object. A parse failure never escapes this
//! module.

use crate::llm::LLMClient;
use crate::research::prompts::{build_context, research_user_prompt};
use crate::types::{AppError, FetchedDocument, ResearchRecord, Result};
use crate::utils::text::strip_code_fence;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// What the research stage produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ResearchOutcome {
    /// The model reply parsed into a record
    Parsed(ResearchRecord),
    /// The reply was unusable; the record carries the error marker
    Fallback(ResearchRecord),
}

impl ResearchOutcome {
    pub fn record(&self) -> &ResearchRecord {
        match self {
            ResearchOutcome::Parsed(record) | ResearchOutcome::Fallback(record) => record,
        }
    }

    pub fn into_record(self) -> ResearchRecord {
        match self {
            ResearchOutcome::Parsed(record) | ResearchOutcome::Fallback(record) => record,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ResearchOutcome::Fallback(_))
    }
}

/// Turns fetched documents into a [`ResearchRecord`] with one model call
pub struct ResearchSynthesizer {
    llm: Arc<dyn LLMClient>,
    system_prompt: String,
    content_chars: usize,
}

impl ResearchSynthesizer {
    pub fn new(llm: Arc<dyn LLMClient>, system_prompt: impl Into<String>, content_chars: usize) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            content_chars,
        }
    }

    /// Generate the research record for `query` from `documents`.
    ///
    /// Only provider errors are returned as `Err`.
    pub async fn synthesize(
        &self,
        query: &str,
        documents: &[FetchedDocument],
    ) -> Result<ResearchOutcome> {
        let context = build_context(documents, self.content_chars);
        let user_prompt = research_user_prompt(query, &context);

        debug!(
            documents = documents.len(),
            prompt_chars = user_prompt.chars().count(),
            model = self.llm.model_name(),
            "Requesting research record"
        );

        let response = self
            .llm
            .generate_with_system(&self.system_prompt, &user_prompt)
            .await?;

        Ok(parse_research_response(query, &response))
    }
}

/// Parse a model reply into a research record, falling back on any failure.
///
/// On success `query` is overwritten with `query` and `completed_at_utc` is
/// set to now, whatever the model put there. An `error` key from the model is
/// dropped so only fallback records carry one. A missing or `null`
/// `coverage_summary` becomes empty; any other shape mismatch falls back.
pub fn parse_research_response(query: &str, response: &str) -> ResearchOutcome {
    match parse_record(query, strip_code_fence(response)) {
        Ok(record) => ResearchOutcome::Parsed(record),
        Err(e) => {
            warn!(error = %e, "Error decoding research JSON, using fallback record");
            ResearchOutcome::Fallback(ResearchRecord::fallback(query, e.to_string()))
        }
    }
}

fn parse_record(query: &str, body: &str) -> Result<ResearchRecord> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::Parse(format!("Invalid JSON: {}", e)))?;

    let Value::Object(mut object) = value else {
        return Err(AppError::Parse(
            "Expected a JSON object at the top level".to_string(),
        ));
    };

    if !matches!(object.get("sources"), Some(Value::Array(_))) {
        return Err(AppError::Parse("Missing 'sources' array".to_string()));
    }

    object.insert("query".to_string(), Value::String(query.to_string()));
    object.insert(
        "completed_at_utc".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    object.remove("error");
    if matches!(object.get("coverage_summary"), None | Some(Value::Null)) {
        object.insert("coverage_summary".to_string(), Value::Object(Map::new()));
    }

    serde_json::from_value(Value::Object(object))
        .map_err(|e| AppError::Parse(format!("Unexpected research shape: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FALLBACK_GAP_MESSAGE;
    use chrono::Duration;

    const VALID: &str = r#"{
        "query": "something the model made up",
        "sources": [
            {"url": "https://a.example", "title": "A", "summary": "About A"}
        ],
        "coverage_summary": {
            "consistent_themes": ["theme"],
            "differences_or_conflicts": [],
            "gaps_or_uncertainties": []
        },
        "key_findings": ["finding"]
    }"#;

    fn expect_parsed(outcome: ResearchOutcome) -> ResearchRecord {
        match outcome {
            ResearchOutcome::Parsed(record) => record,
            ResearchOutcome::Fallback(record) => panic!("Unexpected fallback: {:?}", record.error),
        }
    }

    fn expect_fallback(outcome: ResearchOutcome) -> ResearchRecord {
        match outcome {
            ResearchOutcome::Fallback(record) => record,
            ResearchOutcome::Parsed(record) => panic!("Unexpected parse: {:?}", record),
        }
    }

    #[test]
    fn test_valid_json_overrides_query_and_sets_timestamp() {
        let before = Utc::now();
        let record = expect_parsed(parse_research_response("real query", VALID));

        assert_eq!(record.query, "real query");
        assert!(record.completed_at_utc >= before - Duration::seconds(1));
        assert_eq!(record.sources.len(), 1);
        assert_eq!(record.sources[0].url, "https://a.example");
        assert_eq!(record.sources[0].title.as_deref(), Some("A"));
        assert_eq!(record.sources[0].extra["summary"], "About A");
        assert_eq!(record.coverage_summary.consistent_themes, vec!["theme"]);
        assert!(record.error.is_none());
        assert_eq!(record.extra["key_findings"], serde_json::json!(["finding"]));
    }

    #[test]
    fn test_fenced_json_is_unwrapped() {
        let fenced = format!("```json\n{}\n```", VALID);
        let record = expect_parsed(parse_research_response("q", &fenced));
        assert_eq!(record.sources.len(), 1);
    }

    #[test]
    fn test_missing_coverage_summary_defaults_to_empty() {
        let record = expect_parsed(parse_research_response("q", r#"{"sources": []}"#));
        assert!(record.coverage_summary.gaps_or_uncertainties.is_empty());
    }

    #[test]
    fn test_model_error_key_is_dropped() {
        let reply = r#"{"sources": [{"url": "https://a.example"}], "error": "made up"}"#;
        let record = expect_parsed(parse_research_response("q", reply));

        assert!(record.error.is_none());
        assert!(!record.extra.contains_key("error"));
        assert_eq!(record.sources.len(), 1);
    }

    #[test]
    fn test_null_coverage_summary_is_empty() {
        let reply = r#"{"sources": [{"url": "https://a.example"}], "coverage_summary": null}"#;
        let record = expect_parsed(parse_research_response("q", reply));

        assert!(record.coverage_summary.consistent_themes.is_empty());
        assert_eq!(record.sources.len(), 1);
    }

    #[test]
    fn test_non_string_coverage_items_fall_back() {
        let reply = r#"{
            "sources": [{"url": "https://a.example"}],
            "coverage_summary": {"consistent_themes": [{"theme": "x"}, 3]}
        }"#;
        let record = expect_fallback(parse_research_response("q", reply));

        assert!(record.sources.is_empty());
        assert!(record.error.as_deref().unwrap().contains("Unexpected research shape"));
    }

    #[test]
    fn test_truncated_json_falls_back() {
        let record = expect_fallback(parse_research_response("q", r#"{"sources": [{"url": "#));

        assert_eq!(record.query, "q");
        assert!(record.sources.is_empty());
        assert_eq!(
            record.coverage_summary.gaps_or_uncertainties,
            vec![FALLBACK_GAP_MESSAGE]
        );
        assert!(record.error.as_deref().unwrap().contains("Invalid JSON"));
    }

    #[test]
    fn test_non_object_falls_back() {
        let record = expect_fallback(parse_research_response("q", "[1, 2, 3]"));
        assert!(record.sources.is_empty());
    }

    #[test]
    fn test_wrong_shape_falls_back() {
        expect_fallback(parse_research_response("q", r#"{"summary": "no sources"}"#));
        expect_fallback(parse_research_response("q", r#"{"sources": ["https://a"]}"#));
        expect_fallback(parse_research_response("q", r#"{"sources": [{"title": "no url"}]}"#));
    }

    #[test]
    fn test_plain_text_falls_back() {
        let outcome = parse_research_response("q", "I could not find anything useful.");
        assert!(outcome.is_fallback());
        assert_eq!(outcome.record().query, "q");
    }
}
