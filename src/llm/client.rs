//! LLM Client abstractions and provider management
//!
//! This module provides a unified interface for the generative backends the
//! pipeline talks to:
//! - **Gemini**: Google Generative Language API, single-prompt calls
//! - **OpenRouter**: OpenAI-compatible chat completions with system/user roles

use crate::types::Result;
use crate::utils::toml_config::DelveConfig;
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing pipeline code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection
///
/// A `Provider` is fully resolved: credentials are read and the model is
/// chosen. Build one with
/// [`ConfigBasedLLMFactory::resolve`](crate::llm::ConfigBasedLLMFactory::resolve).
#[derive(Debug, Clone)]
pub enum Provider {
    /// Google Gemini via the Generative Language REST API
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Gemini {
    ///     api_key: "AIza...".to_string(),
    ///     base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
    ///     model: "gemini-1.5-flash".to_string(),
    /// };
    /// ```
    Gemini {
        api_key: String,
        base_url: String,
        model: String,
    },

    /// OpenRouter (OpenAI-compatible API)
    OpenRouter {
        api_key: String,
        api_base: String,
        model: String,
    },
}

impl Provider {
    /// Create a client instance for this provider
    pub fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::Gemini {
                api_key,
                base_url,
                model,
            } => Ok(Box::new(super::gemini::GeminiClient::new(
                api_key.clone(),
                base_url.clone(),
                model.clone(),
            )?)),

            Provider::OpenRouter {
                api_key,
                api_base,
                model,
            } => Ok(Box::new(super::openrouter::OpenRouterClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini { .. } => "Gemini",
            Provider::OpenRouter { .. } => "OpenRouter",
        }
    }

    /// The model this provider resolved to
    pub fn model(&self) -> &str {
        match self {
            Provider::Gemini { model, .. } | Provider::OpenRouter { model, .. } => model,
        }
    }
}

/// Per-request provider and model overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSelection {
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl ModelSelection {
    pub fn new(provider: Option<&str>, model: Option<&str>) -> Self {
        Self {
            provider: provider.map(String::from),
            model: model.map(String::from),
        }
    }
}

/// Trait for LLM client factories
///
/// The pipeline asks the factory for a fresh client at each stage, passing
/// the configuration snapshot of the current request.
#[async_trait]
pub trait LLMClientFactoryTrait: Send + Sync {
    /// Create a client for the given selection under the given configuration
    async fn create_client(
        &self,
        config: &DelveConfig,
        selection: &ModelSelection,
    ) -> Result<Box<dyn LLMClient>>;
}
