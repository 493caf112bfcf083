//! CLI module for Delve
//!
//! Provides command-line interface parsing for the `delve` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Delve - web research with pluggable LLM providers
///
/// Rewrites a question into a search query, reads the top results and
/// answers from the gathered evidence.
#[derive(Parser, Debug)]
#[command(
    name = "delve",
    version,
    about = "Delve - web research with pluggable LLM providers",
    after_help = "EXAMPLES:\n    \
                  delve ask \"How do heat pumps work?\"                   # Research and answer\n    \
                  delve ask \"...\" --provider openrouter --json          # Full output as JSON\n    \
                  delve research \"...\"                                  # Research record only\n    \
                  delve providers                                       # List configured providers\n    \
                  delve --config my.toml config --validate              # Check a config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "delve.toml", global = true, env = "DELVE_CONFIG")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a query and print the final answer
    Ask {
        /// The question to research
        query: String,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Print the answer and research record as one JSON document
        #[arg(long)]
        json: bool,
    },

    /// Research a query and print the research record as JSON
    Research {
        /// The question to research
        query: String,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// List configured LLM providers and their models
    Providers,

    /// Show configuration information
    Config {
        /// Only validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// Provider and model overrides shared by the research commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Model to use instead of the configured default
    #[arg(short, long)]
    pub model: Option<String>,

    /// Provider to use instead of `llm.default_provider`
    #[arg(short, long)]
    pub provider: Option<String>,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
