//! Concurrent article fetching and extraction
//!
//! [`ContentFetcher`] dispatches one extraction task per URL onto a tokio
//! [`JoinSet`], gated by a [`Semaphore`] so that at most `max_workers` tasks
//! run at once. A failing URL is logged and dropped; nothing is retried.
//! Documents come back in completion order, not input order.

use crate::types::{AppError, FetchedDocument, Result};
use crate::utils::toml_config::FetchConfig;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Extracted `(title, text)` of an article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub text: String,
}

/// Fetches one URL and pulls out the article title and body text.
#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<Article>;
}

// ============= HTTP + HTML extraction =============

/// Paragraph containers tried in order; the first one yielding text wins.
const PARAGRAPH_SELECTORS: [&str; 4] = ["article p", "main p", "[role=\"main\"] p", "p"];

/// Extractor that downloads the page with a browser User-Agent and parses it
pub struct HttpArticleExtractor {
    client: reqwest::Client,
}

impl HttpArticleExtractor {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Self::new(&config.user_agent, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl ArticleExtractor for HttpArticleExtractor {
    async fn extract(&self, url: &str) -> Result<Article> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("Request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Fetch(format!("Bad status: {}", e)))?;

        let html = response
            .text()
            .await
            .map_err(|e| AppError::Fetch(format!("Failed to read body: {}", e)))?;

        extract_article(&html)
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| AppError::Internal(format!("Invalid selector '{}': {}", css, e)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pull the title and paragraph text out of an HTML document.
///
/// The title prefers `og:title` over `<title>`. Paragraphs are joined with a
/// blank line. A page with no title or no paragraph text is an error.
pub fn extract_article(html: &str) -> Result<Article> {
    let document = Html::parse_document(html);

    let og_title = selector("meta[property=\"og:title\"]")?;
    let title_tag = selector("title")?;

    let title = document
        .select(&og_title)
        .find_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            document
                .select(&title_tag)
                .next()
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .filter(|t| !t.is_empty())
        })
        .ok_or_else(|| AppError::Fetch("Page has no title".to_string()))?;

    for css in PARAGRAPH_SELECTORS {
        let paragraphs: Vec<String> = document
            .select(&selector(css)?)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|p| !p.is_empty())
            .collect();

        if !paragraphs.is_empty() {
            return Ok(Article {
                title,
                text: paragraphs.join("\n\n"),
            });
        }
    }

    Err(AppError::Fetch("Page has no article text".to_string()))
}

// ============= Bounded concurrent fetcher =============

/// Runs extraction for a batch of URLs on a bounded worker pool
pub struct ContentFetcher {
    extractor: Arc<dyn ArticleExtractor>,
    max_workers: usize,
}

impl ContentFetcher {
    pub fn new(extractor: Arc<dyn ArticleExtractor>, max_workers: usize) -> Self {
        Self {
            extractor,
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Fetch every URL, returning the documents that extracted successfully
    /// in the order their tasks finished.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<FetchedDocument> {
        if urls.is_empty() {
            return Vec::new();
        }

        let permits = Arc::new(Semaphore::new(self.max_workers));
        let mut set = JoinSet::new();

        for url in urls {
            let url = url.clone();
            let extractor = Arc::clone(&self.extractor);
            let permits = Arc::clone(&permits);

            set.spawn(async move {
                // The semaphore is never closed while tasks are outstanding
                let Ok(_permit) = permits.acquire_owned().await else {
                    return None;
                };

                debug!(url = url.as_str(), "Extracting article");
                match extractor.extract(&url).await {
                    Ok(article) => Some(FetchedDocument {
                        url,
                        title: article.title,
                        content: article.text,
                    }),
                    Err(e) => {
                        warn!(url = url.as_str(), error = %e, "Error extracting article");
                        None
                    }
                }
            });
        }

        let mut documents = Vec::with_capacity(urls.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Some(document)) => documents.push(document),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Extraction task panicked or was cancelled"),
            }
        }

        info!(
            requested = urls.len(),
            fetched = documents.len(),
            "Content fetch complete"
        );

        documents
    }
}
