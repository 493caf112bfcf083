use crate::llm::LLMClient;
use crate::research::prompts::answer_user_prompt;
use crate::types::{ResearchRecord, Result};
use std::sync::Arc;
use tracing::debug;

/// Writes the final answer from a research record.
///
/// The model reply is returned exactly as received.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LLMClient>,
    system_prompt: String,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LLMClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    pub async fn answer(&self, query: &str, record: &ResearchRecord) -> Result<String> {
        let user_prompt = answer_user_prompt(query, record)?;

        debug!(
            sources = record.sources.len(),
            model = self.llm.model_name(),
            "Requesting final answer"
        );

        self.llm
            .generate_with_system(&self.system_prompt, &user_prompt)
            .await
    }
}
