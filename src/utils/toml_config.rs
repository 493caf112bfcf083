//! TOML-based configuration for Delve
//!
//! This module provides declarative configuration for prompt templates, LLM
//! providers, the search backend, the article fetcher and pipeline behaviour
//! via a TOML file (`delve.toml`).
//!
//! # Live Reconfiguration
//!
//! The pipeline calls [`DelveConfigManager::refresh`] at the start of every
//! request, so provider, model and prompt changes apply to the next request
//! without a restart. Reads between refreshes are lockless.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Root configuration structure loaded from delve.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelveConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub prompts: PromptConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    /// Named LLM provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub research: ResearchConfig,
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ============= Prompt Configuration =============

/// Paths to the system-prompt templates, read on every use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_researcher_prompt")]
    pub researcher: PathBuf,

    #[serde(default = "default_synthesizer_prompt")]
    pub synthesizer: PathBuf,

    /// Optional; the rewriter falls back to built-in instructions.
    #[serde(default)]
    pub rewriter: Option<PathBuf>,
}

fn default_researcher_prompt() -> PathBuf {
    PathBuf::from("prompts/researcher_system.txt")
}

fn default_synthesizer_prompt() -> PathBuf {
    PathBuf::from("prompts/synthesizer_system.txt")
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            researcher: default_researcher_prompt(),
            synthesizer: default_synthesizer_prompt(),
            rewriter: None,
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider used when a request names none
    #[serde(default = "default_provider_name")]
    pub default_provider: String,

    /// Model used when neither the request nor the provider names one
    #[serde(default)]
    pub default_model: Option<String>,
}

fn default_provider_name() -> String {
    "gemini".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider_name(),
            default_model: None,
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        /// Environment variable containing API key
        api_key_env: String,
        #[serde(default = "default_gemini_base")]
        base_url: String,
        #[serde(default)]
        default_model: Option<String>,
        #[serde(default)]
        models: Vec<String>,
    },
    OpenRouter {
        /// Environment variable containing API key
        api_key_env: String,
        #[serde(default = "default_openrouter_base")]
        api_base: String,
        #[serde(default)]
        default_model: Option<String>,
        #[serde(default)]
        models: Vec<String>,
    },
}

fn default_gemini_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openrouter_base() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

impl ProviderConfig {
    /// Short name of the provider kind
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderConfig::Gemini { .. } => "gemini",
            ProviderConfig::OpenRouter { .. } => "openrouter",
        }
    }

    pub fn api_key_env(&self) -> &str {
        match self {
            ProviderConfig::Gemini { api_key_env, .. }
            | ProviderConfig::OpenRouter { api_key_env, .. } => api_key_env,
        }
    }

    pub fn default_model(&self) -> Option<&str> {
        match self {
            ProviderConfig::Gemini { default_model, .. }
            | ProviderConfig::OpenRouter { default_model, .. } => default_model.as_deref(),
        }
    }

    pub fn models(&self) -> &[String] {
        match self {
            ProviderConfig::Gemini { models, .. } | ProviderConfig::OpenRouter { models, .. } => {
                models
            }
        }
    }
}

/// Catalog entry describing one configured provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderCatalogEntry {
    pub name: String,
    pub kind: String,
    pub default_model: Option<String>,
    pub models: Vec<String>,
    pub is_default: bool,
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// "duckduckgo" or "google"
    #[serde(default = "default_search_tool")]
    pub tool: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default)]
    pub google: GoogleSearchConfig,
}

fn default_search_tool() -> String {
    "duckduckgo".to_string()
}

fn default_max_results() -> usize {
    7
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tool: default_search_tool(),
            max_results: default_max_results(),
            google: GoogleSearchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSearchConfig {
    /// Environment variable containing the Custom Search API key
    #[serde(default = "default_google_key_env")]
    pub api_key_env: String,

    /// Environment variable containing the search engine id
    #[serde(default = "default_google_cse_env")]
    pub cse_id_env: String,

    #[serde(default = "default_google_endpoint")]
    pub endpoint: String,
}

fn default_google_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_google_cse_env() -> String {
    "GOOGLE_CSE_ID".to_string()
}

fn default_google_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

impl Default for GoogleSearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_google_key_env(),
            cse_id_env: default_google_cse_env(),
            endpoint: default_google_endpoint(),
        }
    }
}

// ============= Fetch Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of extraction tasks running at once
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Characters of each article embedded in prompts
    #[serde(default = "default_content_chars")]
    pub content_chars: usize,
}

fn default_max_workers() -> usize {
    10
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_content_chars() -> usize {
    1500
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
            content_chars: default_content_chars(),
        }
    }
}

// ============= Research Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Search with the original query when rewriting fails instead of aborting
    #[serde(default)]
    pub rewrite_fallback: bool,
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Default provider '{0}' is not defined in [providers]")]
    MissingProvider(String),
}

impl Default for DelveConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            prompts: PromptConfig::default(),
            llm: LlmConfig::default(),
            providers: HashMap::new(),
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
            research: ResearchConfig::default(),
        }
    }
}

impl DelveConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: DelveConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate internal consistency.
    ///
    /// Credentials and the search tool name are resolved when a backend is
    /// selected, not here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.providers.is_empty() && !self.providers.contains_key(&self.llm.default_provider) {
            return Err(ConfigError::MissingProvider(self.llm.default_provider.clone()));
        }

        if self.search.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "search.max_results must be at least 1".to_string(),
            ));
        }

        if self.fetch.max_workers == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.max_workers must be at least 1".to_string(),
            ));
        }

        if self.fetch.content_chars == 0 {
            return Err(ConfigError::ValidationError(
                "fetch.content_chars must be at least 1".to_string(),
            ));
        }

        for (name, provider) in &self.providers {
            if provider.api_key_env().trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Provider '{}' has an empty api_key_env",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }

    /// Resolve a credential, failing when the variable is unset or blank
    pub fn require_env(&self, env_name: &str) -> Result<String, ConfigError> {
        self.resolve_env(env_name)
            .ok_or_else(|| ConfigError::MissingEnvVar(env_name.to_string()))
    }

    /// Get provider by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// All configured providers with their models, sorted by name
    pub fn provider_catalog(&self) -> Vec<ProviderCatalogEntry> {
        let mut entries: Vec<ProviderCatalogEntry> = self
            .providers
            .iter()
            .map(|(name, provider)| ProviderCatalogEntry {
                name: name.clone(),
                kind: provider.kind().to_string(),
                default_model: provider
                    .default_model()
                    .map(String::from)
                    .or_else(|| self.llm.default_model.clone()),
                models: provider.models().to_vec(),
                is_default: name == &self.llm.default_provider,
            })
            .collect();

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

// ============= Configuration Manager =============

/// Thread-safe configuration holder that re-reads its file on demand
pub struct DelveConfigManager {
    config: ArcSwap<DelveConfig>,
    config_path: Option<PathBuf>,
}

impl DelveConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Convert to absolute path so later refreshes survive a cwd change
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = DelveConfig::load(&path)?;

        Ok(Self {
            config: ArcSwap::from_pointee(config),
            config_path: Some(path),
        })
    }

    /// Create a config manager directly from a config (useful for testing).
    /// `refresh` returns this config unchanged.
    pub fn from_config(config: DelveConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            config_path: None,
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<DelveConfig> {
        self.config.load_full()
    }

    /// Path the configuration is read from, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Re-read the configuration file and return the fresh snapshot.
    ///
    /// A file that fails to load or validate is an error; the stored
    /// snapshot is left unchanged.
    pub fn refresh(&self) -> Result<Arc<DelveConfig>, ConfigError> {
        let Some(path) = &self.config_path else {
            return Ok(self.config());
        };

        match DelveConfig::load(path) {
            Ok(new_config) => {
                let new_config = Arc::new(new_config);
                self.config.store(Arc::clone(&new_config));
                debug!(path = %path.display(), "Configuration refreshed");
                Ok(new_config)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to refresh config");
                Err(e)
            }
        }
    }
}
