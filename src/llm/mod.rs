//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for the generative text backends
//! used by every pipeline stage. Provider-specific code sits behind the
//! [`LLMClient`] trait so stages never know which backend answered.
//!
//! # Architecture
//!
//! The module follows a factory pattern:
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - A fully resolved provider (credentials + model)
//! - [`LLMClientFactoryTrait`] - Factory trait the pipeline depends on
//! - [`ConfigBasedLLMFactory`] - Resolves providers from `delve.toml` per request
//!
//! # Example
//!
//! ```ignore
//! use delve::llm::{ConfigBasedLLMFactory, LLMClientFactoryTrait, ModelSelection};
//!
//! let factory = ConfigBasedLLMFactory::new();
//! let selection = ModelSelection::new(Some("openrouter"), None);
//! let client = factory.create_client(&config, &selection).await?;
//!
//! let answer = client.generate_with_system("Be brief.", "What is 2+2?").await?;
//! ```

/// Core LLM client trait and provider enum.
pub mod client;
/// Google Gemini REST client.
pub mod gemini;
/// OpenRouter chat-completions client.
pub mod openrouter;
/// Configuration-driven provider resolution.
pub mod provider_registry;

pub use client::{LLMClient, LLMClientFactoryTrait, ModelSelection, Provider};
pub use provider_registry::ConfigBasedLLMFactory;
