//! Evidence-gathering tools used by the research stage
//!
//! # Module Structure
//!
//! - [`search`](crate::tools::search) - Web search backends (DuckDuckGo, Google Custom Search)
//! - [`fetch`](crate::tools::fetch) - Concurrent article download and text extraction
//!
//! # Web Search
//!
//! ```ignore
//! let provider = ConfigBasedSearchFactory::new().create_provider(&config)?;
//! for hit in provider.search("rust async runtimes", 7).await? {
//!     println!("{}: {}", hit.title, hit.link);
//! }
//! ```
//!
//! # Fetching
//!
//! ```ignore
//! let extractor = Arc::new(HttpArticleExtractor::from_config(&config.fetch)?);
//! let fetcher = ContentFetcher::new(extractor, config.fetch.max_workers);
//! let documents = fetcher.fetch_all(&urls).await;
//! ```

/// Bounded-concurrency article fetching.
pub mod fetch;
/// Web search providers.
pub mod search;
