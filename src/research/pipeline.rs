//! Stage orchestration
//!
//! [`ResearchPipeline`] runs rewrite, search, fetch, research and answer in
//! sequence. Every entry point takes a fresh configuration snapshot from the
//! [`DelveConfigManager`], so provider, model and prompt changes apply to the
//! next request without a restart. Backends are built per call through the
//! injected factories.

use crate::llm::{ConfigBasedLLMFactory, LLMClient, LLMClientFactoryTrait, ModelSelection};
use crate::research::answer::AnswerSynthesizer;
use crate::research::prompts::{load_template, resolve_template_path};
use crate::research::rewriter::QueryRewriter;
use crate::research::synthesizer::{ResearchOutcome, ResearchSynthesizer};
use crate::tools::fetch::{ArticleExtractor, ContentFetcher, HttpArticleExtractor};
use crate::tools::search::{ConfigBasedSearchFactory, SearchProviderFactory};
use crate::types::{AppError, ResearchOutput, ResearchRecord, Result};
use crate::utils::toml_config::{DelveConfig, DelveConfigManager};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// The end-to-end research pipeline
pub struct ResearchPipeline {
    config_manager: Arc<DelveConfigManager>,
    llm_factory: Arc<dyn LLMClientFactoryTrait>,
    search_factory: Arc<dyn SearchProviderFactory>,
    extractor: Option<Arc<dyn ArticleExtractor>>,
}

impl ResearchPipeline {
    /// Pipeline with the configuration-driven factories and HTTP extraction
    pub fn new(config_manager: Arc<DelveConfigManager>) -> Self {
        Self::builder(config_manager).build()
    }

    pub fn builder(config_manager: Arc<DelveConfigManager>) -> ResearchPipelineBuilder {
        ResearchPipelineBuilder::new(config_manager)
    }

    /// Rewrite, search, fetch and synthesize a research record for `query`.
    pub async fn run_research(
        &self,
        query: &str,
        model: Option<&str>,
        provider: Option<&str>,
    ) -> Result<ResearchRecord> {
        let query = validate_query(query)?;
        let config = self.config_manager.refresh()?;
        let started = Instant::now();

        let llm = self.llm_client(&config, model, provider).await?;
        info!(query, model = llm.model_name(), "Starting research");

        let system_prompt = self.template(&config.prompts.researcher).await?;

        let search_query = self.rewrite_query(&config, Arc::clone(&llm), query).await?;

        let search = self.search_factory.create_provider(&config)?;
        let hits = search
            .search(&search_query, config.search.max_results)
            .await?;

        let urls: Vec<String> = hits
            .into_iter()
            .map(|hit| hit.link)
            .filter(|link| !link.trim().is_empty())
            .take(config.search.max_results)
            .collect();
        info!(
            search = search.name(),
            search_query = search_query.as_str(),
            urls = urls.len(),
            "Search complete"
        );

        let fetcher = ContentFetcher::new(self.extractor(&config)?, config.fetch.max_workers);
        let documents = fetcher.fetch_all(&urls).await;
        if documents.is_empty() {
            warn!(query, "No documents extracted, researching with empty context");
        }

        let synthesizer = ResearchSynthesizer::new(llm, system_prompt, config.fetch.content_chars);
        let outcome = synthesizer.synthesize(query, &documents).await?;

        if let ResearchOutcome::Fallback(record) = &outcome {
            warn!(query, error = ?record.error, "Research record replaced by fallback");
        }

        let record = outcome.into_record();
        info!(
            query,
            sources = record.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Research complete"
        );

        Ok(record)
    }

    /// Produce the final answer for `query` from a research record.
    pub async fn synthesize_answer(
        &self,
        query: &str,
        record: &ResearchRecord,
        model: Option<&str>,
        provider: Option<&str>,
    ) -> Result<String> {
        let query = validate_query(query)?;
        let config = self.config_manager.refresh()?;
        let started = Instant::now();

        let llm = self.llm_client(&config, model, provider).await?;
        let system_prompt = self.template(&config.prompts.synthesizer).await?;

        info!(query, model = llm.model_name(), "Synthesizing answer");
        let answer = AnswerSynthesizer::new(llm, system_prompt)
            .answer(query, record)
            .await?;

        info!(
            answer_chars = answer.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Answer complete"
        );

        Ok(answer)
    }

    /// Research then answer.
    pub async fn run(
        &self,
        query: &str,
        model: Option<&str>,
        provider: Option<&str>,
    ) -> Result<ResearchOutput> {
        let research_data = self.run_research(query, model, provider).await?;
        let final_answer = self
            .synthesize_answer(query, &research_data, model, provider)
            .await?;

        Ok(ResearchOutput {
            final_answer,
            research_data,
        })
    }

    async fn llm_client(
        &self,
        config: &DelveConfig,
        model: Option<&str>,
        provider: Option<&str>,
    ) -> Result<Arc<dyn LLMClient>> {
        let selection = ModelSelection::new(provider, model);
        let client = self.llm_factory.create_client(config, &selection).await?;
        Ok(Arc::from(client))
    }

    async fn template(&self, path: &Path) -> Result<String> {
        let path = resolve_template_path(self.config_manager.path(), path);
        load_template(&path).await
    }

    async fn rewrite_query(
        &self,
        config: &DelveConfig,
        llm: Arc<dyn LLMClient>,
        query: &str,
    ) -> Result<String> {
        let rewriter = match &config.prompts.rewriter {
            Some(path) => QueryRewriter::new(llm, self.template(path).await?),
            None => QueryRewriter::with_default_instructions(llm),
        };

        match rewriter.rewrite(query).await {
            Ok(rewritten) => Ok(rewritten),
            Err(e) if config.research.rewrite_fallback => {
                warn!(error = %e, "Query rewrite failed, searching with the original query");
                Ok(query.to_string())
            }
            Err(e) => Err(e),
        }
    }

    fn extractor(&self, config: &DelveConfig) -> Result<Arc<dyn ArticleExtractor>> {
        match &self.extractor {
            Some(extractor) => Ok(Arc::clone(extractor)),
            None => Ok(Arc::new(HttpArticleExtractor::from_config(&config.fetch)?)),
        }
    }
}

fn validate_query(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput("Query must not be empty".to_string()));
    }
    Ok(query)
}

/// Builder for [`ResearchPipeline`]; unset collaborators use the defaults
pub struct ResearchPipelineBuilder {
    config_manager: Arc<DelveConfigManager>,
    llm_factory: Option<Arc<dyn LLMClientFactoryTrait>>,
    search_factory: Option<Arc<dyn SearchProviderFactory>>,
    extractor: Option<Arc<dyn ArticleExtractor>>,
}

impl ResearchPipelineBuilder {
    pub fn new(config_manager: Arc<DelveConfigManager>) -> Self {
        Self {
            config_manager,
            llm_factory: None,
            search_factory: None,
            extractor: None,
        }
    }

    pub fn with_llm_factory(mut self, factory: Arc<dyn LLMClientFactoryTrait>) -> Self {
        self.llm_factory = Some(factory);
        self
    }

    pub fn with_search_factory(mut self, factory: Arc<dyn SearchProviderFactory>) -> Self {
        self.search_factory = Some(factory);
        self
    }

    /// Use a fixed extractor instead of one built from `[fetch]` per request
    pub fn with_extractor(mut self, extractor: Arc<dyn ArticleExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn build(self) -> ResearchPipeline {
        ResearchPipeline {
            config_manager: self.config_manager,
            llm_factory: self
                .llm_factory
                .unwrap_or_else(|| Arc::new(ConfigBasedLLMFactory::new())),
            search_factory: self
                .search_factory
                .unwrap_or_else(|| Arc::new(ConfigBasedSearchFactory::new())),
            extractor: self.extractor,
        }
    }
}
