//! Web search backends
//!
//! Two interchangeable backends sit behind [`SearchProvider`]:
//! - [`DuckDuckGoSearch`] via the daedra crate, no credentials
//! - [`GoogleSearch`] via the Custom Search JSON API, API key + engine id
//!
//! The backend is chosen per request from `search.tool` by
//! [`ConfigBasedSearchFactory`].

use crate::types::{AppError, Result, SearchHit};
use crate::utils::toml_config::DelveConfig;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Uniform web-search capability.
///
/// Results are in backend relevance order, at most `max_results` long, and
/// may be shorter than requested.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    fn name(&self) -> &str;
}

/// Builds the search backend for a request.
pub trait SearchProviderFactory: Send + Sync {
    fn create_provider(&self, config: &DelveConfig) -> Result<Box<dyn SearchProvider>>;
}

// ============= DuckDuckGo =============

/// DuckDuckGo search powered by daedra
#[derive(Debug, Default, Clone)]
pub struct DuckDuckGoSearch;

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: max_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| AppError::Search(format!("DuckDuckGo search failed: {}", e)))?;

        Ok(response
            .data
            .iter()
            .map(|r| SearchHit {
                title: r.title.clone(),
                link: r.url.clone(),
            })
            .filter(|hit| !hit.link.is_empty())
            .take(max_results)
            .collect())
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

// ============= Google Custom Search =============

/// The Custom Search API never returns more than 10 items per page.
const GOOGLE_MAX_PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct GoogleSearchResponse {
    #[serde(default)]
    items: Vec<GoogleSearchItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleSearchItem {
    #[serde(default)]
    title: String,
    link: String,
}

/// Google Custom Search JSON API client
pub struct GoogleSearch {
    client: reqwest::Client,
    api_key: String,
    cse_id: String,
    endpoint: String,
}

impl GoogleSearch {
    pub fn new(api_key: String, cse_id: String, endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            cse_id,
            endpoint,
        }
    }

    /// Build from configuration, failing when either credential is absent
    pub fn from_config(config: &DelveConfig) -> Result<Self> {
        let google = &config.search.google;
        let (api_key, cse_id) = match (
            config.resolve_env(&google.api_key_env),
            config.resolve_env(&google.cse_id_env),
        ) {
            (Some(key), Some(cse)) => (key, cse),
            _ => {
                return Err(AppError::Configuration(format!(
                    "{} and {} must be set for Google Search",
                    google.api_key_env, google.cse_id_env
                )));
            }
        };

        Ok(Self::new(api_key, cse_id, google.endpoint.clone()))
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let num = max_results.clamp(1, GOOGLE_MAX_PAGE_SIZE).to_string();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cse_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Google search request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Search(format!("Google search failed: {}", e)))?;

        let body: GoogleSearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Invalid Google search response: {}", e)))?;

        Ok(body
            .items
            .into_iter()
            .map(|item| SearchHit {
                title: item.title,
                link: item.link,
            })
            .take(max_results)
            .collect())
    }

    fn name(&self) -> &str {
        "google"
    }
}

// ============= Factory =============

/// Selects the backend named by `search.tool`
#[derive(Debug, Default, Clone)]
pub struct ConfigBasedSearchFactory;

impl ConfigBasedSearchFactory {
    pub fn new() -> Self {
        Self
    }
}

impl SearchProviderFactory for ConfigBasedSearchFactory {
    fn create_provider(&self, config: &DelveConfig) -> Result<Box<dyn SearchProvider>> {
        debug!(tool = config.search.tool.as_str(), "Selecting search backend");

        match config.search.tool.as_str() {
            "duckduckgo" => Ok(Box::new(DuckDuckGoSearch::new())),
            "google" => Ok(Box::new(GoogleSearch::from_config(config)?)),
            other => Err(AppError::Configuration(format!(
                "Invalid search tool specified in config: {}",
                other
            ))),
        }
    }
}
