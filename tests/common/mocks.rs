//! Mock implementations for testing.
//!
//! These stand in for the LLM, search and extraction backends so the pipeline
//! can be driven end to end without network access.

use async_trait::async_trait;
use delve::llm::{LLMClient, LLMClientFactoryTrait, ModelSelection};
use delve::tools::fetch::{Article, ArticleExtractor};
use delve::tools::search::{SearchProvider, SearchProviderFactory};
use delve::types::{AppError, Result, SearchHit};
use delve::utils::toml_config::{DelveConfig, DelveConfigManager};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ============= LLM =============

/// One scripted LLM reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail,
}

/// A `(system, prompt)` pair the mock was called with.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub prompt: String,
    pub model: String,
}

/// Replies consumed in order by every client a [`MockLLMFactory`] creates.
///
/// # Examples
///
/// ```ignore
/// let script = LlmScript::new(vec![
///     MockReply::Text("rewritten query".into()),
///     MockReply::Text(r#"{"sources": []}"#.into()),
///     MockReply::Text("final answer".into()),
/// ]);
/// ```
#[derive(Clone, Default)]
pub struct LlmScript {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl LlmScript {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::default(),
        }
    }

    /// Shorthand for a script of plain text replies.
    pub fn texts(replies: &[&str]) -> Self {
        Self::new(
            replies
                .iter()
                .map(|r| MockReply::Text(r.to_string()))
                .collect(),
        )
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, system: &str, prompt: &str, model: &str) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.to_string(),
            prompt: prompt.to_string(),
            model: model.to_string(),
        });

        match self.replies.lock().unwrap().pop_front() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail) => Err(AppError::LLM("Mock LLM failure".to_string())),
            None => Err(AppError::LLM("Mock LLM has no scripted reply left".to_string())),
        }
    }
}

/// Mock LLM client driven by a shared [`LlmScript`].
pub struct MockLLMClient {
    script: LlmScript,
    model: String,
}

impl MockLLMClient {
    pub fn new(script: LlmScript, model: &str) -> Self {
        Self {
            script,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.script.next("", prompt, &self.model)
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.script.next(system, prompt, &self.model)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Factory returning [`MockLLMClient`]s and recording the selections asked for.
///
/// The model name is the selection's model, falling back to the configured
/// `llm.default_model`, then `"mock-model"`. An unknown provider override
/// yields a configuration error the way the real factory does.
#[derive(Clone, Default)]
pub struct MockLLMFactory {
    pub script: LlmScript,
    selections: Arc<Mutex<Vec<ModelSelection>>>,
}

impl MockLLMFactory {
    pub fn new(script: LlmScript) -> Self {
        Self {
            script,
            selections: Arc::default(),
        }
    }

    pub fn selections(&self) -> Vec<ModelSelection> {
        self.selections.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMClientFactoryTrait for MockLLMFactory {
    async fn create_client(
        &self,
        config: &DelveConfig,
        selection: &ModelSelection,
    ) -> Result<Box<dyn LLMClient>> {
        self.selections.lock().unwrap().push(selection.clone());

        if let Some(provider) = &selection.provider
            && config.get_provider(provider).is_none()
        {
            return Err(AppError::Configuration(format!(
                "Unsupported LLM provider '{}'",
                provider
            )));
        }

        let model = selection
            .model
            .clone()
            .or_else(|| config.llm.default_model.clone())
            .unwrap_or_else(|| "mock-model".to_string());

        Ok(Box::new(MockLLMClient::new(self.script.clone(), &model)))
    }
}

// ============= Search =============

/// Search backend returning fixed hits, or failing.
#[derive(Clone, Default)]
pub struct MockSearch {
    hits: Vec<SearchHit>,
    should_fail: bool,
    queries: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockSearch {
    pub fn new(links: &[&str]) -> Self {
        Self {
            hits: links
                .iter()
                .map(|link| SearchHit {
                    title: format!("Result for {}", link),
                    link: link.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Every `(query, max_results)` the backend received.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));

        if self.should_fail {
            return Err(AppError::Search("Mock search failure".to_string()));
        }

        Ok(self.hits.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl SearchProviderFactory for MockSearch {
    fn create_provider(&self, _config: &DelveConfig) -> Result<Box<dyn SearchProvider>> {
        Ok(Box::new(self.clone()))
    }
}

// ============= Extraction =============

/// Extractor serving canned articles and tracking how many run at once.
///
/// URLs without a canned article fail with a fetch error.
#[derive(Clone, Default)]
pub struct MockExtractor {
    articles: HashMap<String, Article>,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_article(mut self, url: &str, title: &str, text: &str) -> Self {
        self.articles.insert(
            url.to_string(),
            Article {
                title: title.to_string(),
                text: text.to_string(),
            },
        );
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Highest number of extractions observed running concurrently.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleExtractor for MockExtractor {
    async fn extract(&self, url: &str) -> Result<Article> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.articles
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::Fetch(format!("Mock extraction failed for {}", url)))
    }
}

// ============= Configuration =============

pub const RESEARCHER_PROMPT: &str = "You are a meticulous research assistant. Reply with JSON only.";
pub const SYNTHESIZER_PROMPT: &str = "You write clear answers from research data.";

/// A config file plus prompt templates in a temporary directory.
pub struct TestConfig {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TestConfig {
    /// Write prompt templates and a `delve.toml` whose body is `extra`
    /// appended to a minimal provider section.
    pub fn new(extra: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("prompts")).unwrap();
        std::fs::write(
            dir.path().join("prompts/researcher_system.txt"),
            RESEARCHER_PROMPT,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("prompts/synthesizer_system.txt"),
            SYNTHESIZER_PROMPT,
        )
        .unwrap();

        let path = dir.path().join("delve.toml");
        let content = format!(
            r#"
[llm]
default_provider = "gemini"
default_model = "gemini-test"

[providers.gemini]
type = "gemini"
api_key_env = "DELVE_TEST_UNUSED_GEMINI_KEY"

[providers.openrouter]
type = "openrouter"
api_key_env = "DELVE_TEST_UNUSED_OPENROUTER_KEY"

{extra}
"#
        );
        std::fs::write(&path, content).unwrap();

        Self { dir, path }
    }

    pub fn manager(&self) -> Arc<DelveConfigManager> {
        Arc::new(DelveConfigManager::new(&self.path).unwrap())
    }
}
