//! The research pipeline
//!
//! A query flows through four stages, driven by
//! [`pipeline::ResearchPipeline`]:
//!
//! 1. **Rewrite** - [`rewriter::QueryRewriter`] rephrases the query for search
//! 2. **Gather** - search hits are fetched concurrently by
//!    [`ContentFetcher`](crate::tools::fetch::ContentFetcher)
//! 3. **Research** - [`synthesizer::ResearchSynthesizer`] turns the evidence
//!    into a [`ResearchRecord`](crate::types::ResearchRecord), falling back to a
//!    minimal record when the model output is not usable JSON
//! 4. **Answer** - [`answer::AnswerSynthesizer`] writes the final free-text answer
//!
//! # Usage
//!
//! ```ignore
//! use delve::research::pipeline::ResearchPipeline;
//! use delve::utils::toml_config::DelveConfigManager;
//!
//! let manager = Arc::new(DelveConfigManager::new("delve.toml")?);
//! let pipeline = ResearchPipeline::new(manager);
//!
//! let output = pipeline
//!     .run("What is the difference between market research and marketing research?", None, None)
//!     .await?;
//!
//! println!("{}", output.final_answer);
//! for source in &output.research_data.sources {
//!     println!("- {}", source.url);
//! }
//! ```

/// Final answer generation.
pub mod answer;
/// Stage orchestration.
pub mod pipeline;
/// Prompt templates and prompt assembly.
pub mod prompts;
/// Search query rewriting.
pub mod rewriter;
/// Structured research generation and recovery.
pub mod synthesizer;

pub use pipeline::{ResearchPipeline, ResearchPipelineBuilder};
pub use synthesizer::ResearchOutcome;
