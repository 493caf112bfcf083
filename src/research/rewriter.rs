use crate::llm::LLMClient;
use crate::types::Result;
use crate::utils::text::trim_quotes;
use std::sync::Arc;
use tracing::debug;

/// Instructions used when no rewriter template is configured.
pub const DEFAULT_REWRITE_INSTRUCTIONS: &str = "You rewrite user questions into effective web search queries. \
Keep the meaning and every important entity, drop filler words, and prefer the terms a relevant article would use. \
Reply with the search query only: no explanation, no quotes, no punctuation at the end.";

/// Rephrases a raw user query into a search query
pub struct QueryRewriter {
    llm: Arc<dyn LLMClient>,
    instructions: String,
}

impl QueryRewriter {
    pub fn new(llm: Arc<dyn LLMClient>, instructions: impl Into<String>) -> Self {
        Self {
            llm,
            instructions: instructions.into(),
        }
    }

    pub fn with_default_instructions(llm: Arc<dyn LLMClient>) -> Self {
        Self::new(llm, DEFAULT_REWRITE_INSTRUCTIONS)
    }

    /// Rewrite `query`. Provider errors propagate; an empty rewrite yields the
    /// original query.
    pub async fn rewrite(&self, query: &str) -> Result<String> {
        let response = self
            .llm
            .generate_with_system(&self.instructions, query)
            .await?;

        let rewritten = trim_quotes(&response);
        if rewritten.is_empty() {
            debug!("Rewriter returned nothing, keeping original query");
            return Ok(query.to_string());
        }

        debug!(original = query, rewritten, "Query rewritten");
        Ok(rewritten.to_string())
    }
}
