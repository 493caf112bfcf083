//! # Delve
//!
//! A web research pipeline: a query is rewritten for search, the top hits are
//! fetched concurrently, a generative model turns the evidence into a
//! structured [`ResearchRecord`], and a second call writes the final answer.
//!
//! ## Overview
//!
//! Delve can be used in two ways:
//!
//! 1. **As a command-line tool** - Run the `delve` binary
//! 2. **As a library** - Embed [`ResearchPipeline`] in your own service
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use delve::{DelveConfigManager, ResearchPipeline};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = Arc::new(DelveConfigManager::new("delve.toml")?);
//!     let pipeline = ResearchPipeline::new(manager);
//!
//!     let record = pipeline.run_research("How do heat pumps work?", None, None).await?;
//!     let answer = pipeline
//!         .synthesize_answer("How do heat pumps work?", &record, None, None)
//!         .await?;
//!
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```
//!
//! ### Swapping Backends
//!
//! Every backend is reached through a trait, so tests and embedders can plug
//! in their own:
//!
//! ```rust,ignore
//! let pipeline = ResearchPipeline::builder(manager)
//!     .with_llm_factory(Arc::new(MyLLMFactory))
//!     .with_search_factory(Arc::new(MySearchFactory))
//!     .with_extractor(Arc::new(MyExtractor))
//!     .build();
//! ```
//!
//! ## Configuration
//!
//! Providers, models, prompt templates, search and fetch settings live in
//! `delve.toml`. The file is re-read at the start of every pipeline call, so
//! edits take effect on the next request. Credentials are read from the
//! environment variables the file names.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// LLM provider clients and abstractions.
pub mod llm;
/// The research pipeline and its stages.
pub mod research;
/// Web search and article fetching.
pub mod tools;
/// Core types (records, errors).
pub mod types;
/// Configuration and text utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{ConfigBasedLLMFactory, LLMClient, LLMClientFactoryTrait, ModelSelection, Provider};
pub use research::{ResearchOutcome, ResearchPipeline, ResearchPipelineBuilder};
pub use tools::fetch::{ArticleExtractor, ContentFetcher, HttpArticleExtractor};
pub use tools::search::{SearchProvider, SearchProviderFactory};
pub use types::{AppError, FetchedDocument, ResearchOutput, ResearchRecord, Result, SearchHit};
pub use utils::toml_config::{DelveConfig, DelveConfigManager};
