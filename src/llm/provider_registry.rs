//! Configuration-driven provider resolution
//!
//! Maps a request's provider/model overrides onto the `[providers.*]` table of
//! the current configuration snapshot and produces a ready [`Provider`].
//!
//! # Resolution order
//!
//! - provider: request override, then `llm.default_provider`
//! - model: request override, then the provider's `default_model`, then
//!   `llm.default_model`

use crate::llm::client::{LLMClient, LLMClientFactoryTrait, ModelSelection, Provider};
use crate::types::{AppError, Result};
use crate::utils::toml_config::{DelveConfig, ProviderConfig};
use async_trait::async_trait;
use tracing::debug;

/// Configuration-based LLM client factory
///
/// Holds no state: everything is read from the snapshot passed per call.
#[derive(Debug, Clone, Default)]
pub struct ConfigBasedLLMFactory;

impl ConfigBasedLLMFactory {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the provider and model for a request without creating a client
    pub fn resolve(config: &DelveConfig, selection: &ModelSelection) -> Result<Provider> {
        let provider_name = selection
            .provider
            .as_deref()
            .unwrap_or(config.llm.default_provider.as_str());

        let provider_config = config.get_provider(provider_name).ok_or_else(|| {
            AppError::Configuration(format!(
                "Unsupported LLM provider '{}'. Configured providers: {}",
                provider_name,
                configured_names(config)
            ))
        })?;

        let model = selection
            .model
            .clone()
            .or_else(|| provider_config.default_model().map(String::from))
            .or_else(|| config.llm.default_model.clone())
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "No model configured for provider '{}'",
                    provider_name
                ))
            })?;

        let api_key = config.require_env(provider_config.api_key_env())?;

        let provider = match provider_config {
            ProviderConfig::Gemini { base_url, .. } => Provider::Gemini {
                api_key,
                base_url: base_url.clone(),
                model,
            },
            ProviderConfig::OpenRouter { api_base, .. } => Provider::OpenRouter {
                api_key,
                api_base: api_base.clone(),
                model,
            },
        };

        debug!(
            provider = provider_name,
            model = provider.model(),
            "Resolved LLM provider"
        );

        Ok(provider)
    }
}

fn configured_names(config: &DelveConfig) -> String {
    let mut names: Vec<&str> = config.providers.keys().map(|s| s.as_str()).collect();
    if names.is_empty() {
        return "(none)".to_string();
    }
    names.sort_unstable();
    names.join(", ")
}

#[async_trait]
impl LLMClientFactoryTrait for ConfigBasedLLMFactory {
    async fn create_client(
        &self,
        config: &DelveConfig,
        selection: &ModelSelection,
    ) -> Result<Box<dyn LLMClient>> {
        Self::resolve(config, selection)?.create_client()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEMINI_KEY_ENV: &str = "DELVE_REGISTRY_TEST_GEMINI_KEY";
    const OPENROUTER_KEY_ENV: &str = "DELVE_REGISTRY_TEST_OPENROUTER_KEY";
    const MISSING_KEY_ENV: &str = "DELVE_REGISTRY_TEST_MISSING_KEY";

    fn create_test_config() -> DelveConfig {
        // SAFETY: every test in this module sets the same values
        unsafe {
            std::env::set_var(GEMINI_KEY_ENV, "gemini-secret");
            std::env::set_var(OPENROUTER_KEY_ENV, "openrouter-secret");
        }

        let content = format!(
            r#"
[llm]
default_provider = "gemini"
default_model = "global-fallback-model"

[providers.gemini]
type = "gemini"
api_key_env = "{GEMINI_KEY_ENV}"
default_model = "gemini-1.5-flash"

[providers.openrouter]
type = "openrouter"
api_key_env = "{OPENROUTER_KEY_ENV}"

[providers.keyless]
type = "openrouter"
api_key_env = "{MISSING_KEY_ENV}"
default_model = "some/model"
"#
        );

        toml::from_str(&content).expect("test config parses")
    }

    #[test]
    fn test_default_provider_and_model() {
        let config = create_test_config();
        let provider = ConfigBasedLLMFactory::resolve(&config, &ModelSelection::default()).unwrap();

        match provider {
            Provider::Gemini { api_key, model, .. } => {
                assert_eq!(api_key, "gemini-secret");
                assert_eq!(model, "gemini-1.5-flash");
            }
            other => panic!("Expected Gemini provider, got {:?}", other),
        }
    }

    #[test]
    fn test_model_override_wins() {
        let config = create_test_config();
        let selection = ModelSelection::new(None, Some("gemini-1.5-pro"));
        let provider = ConfigBasedLLMFactory::resolve(&config, &selection).unwrap();
        assert_eq!(provider.model(), "gemini-1.5-pro");
    }

    #[test]
    fn test_provider_override_uses_global_model_when_provider_has_none() {
        let config = create_test_config();
        let selection = ModelSelection::new(Some("openrouter"), None);
        let provider = ConfigBasedLLMFactory::resolve(&config, &selection).unwrap();

        assert_eq!(provider.name(), "OpenRouter");
        assert_eq!(provider.model(), "global-fallback-model");
    }

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let config = create_test_config();
        let selection = ModelSelection::new(Some("anthropic"), None);
        let err = ConfigBasedLLMFactory::resolve(&config, &selection).unwrap_err();

        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("anthropic"));
        assert!(err.to_string().contains("gemini, keyless, openrouter"));
    }

    #[test]
    fn test_missing_credentials_is_configuration_error() {
        let config = create_test_config();
        let selection = ModelSelection::new(Some("keyless"), None);
        let err = ConfigBasedLLMFactory::resolve(&config, &selection).unwrap_err();

        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains(MISSING_KEY_ENV));
    }

    #[test]
    fn test_no_model_anywhere_is_configuration_error() {
        let mut config = create_test_config();
        config.llm.default_model = None;
        let selection = ModelSelection::new(Some("openrouter"), None);
        let err = ConfigBasedLLMFactory::resolve(&config, &selection).unwrap_err();

        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_factory_creates_client_for_selection() {
        let config = create_test_config();
        let factory = ConfigBasedLLMFactory::new();
        let client = factory
            .create_client(&config, &ModelSelection::new(Some("openrouter"), Some("x/y")))
            .await
            .unwrap();

        assert_eq!(client.model_name(), "x/y");
    }
}
