mod cli;

use anyhow::Context;
use cli::output::Output;
use cli::{Cli, Commands, SelectionArgs};
use delve::utils::toml_config::{DelveConfig, DelveConfigManager, LoggingConfig};
use delve::ResearchPipeline;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Commands::Config { validate: true } = cli.command {
        return validate_config(&cli.config, &output);
    }

    let manager = DelveConfigManager::new(&cli.config).with_context(|| {
        format!("Failed to load configuration from {}", cli.config.display())
    })?;
    let manager = Arc::new(manager);

    init_tracing(&manager.config().logging, cli.verbose);

    match cli.command {
        Commands::Ask {
            query,
            selection,
            json,
        } => ask(&manager, &output, &query, &selection, json).await,
        Commands::Research { query, selection } => {
            let pipeline = ResearchPipeline::new(Arc::clone(&manager));
            output.step(1, 1, "Researching");
            let record = pipeline
                .run_research(
                    &query,
                    selection.model.as_deref(),
                    selection.provider.as_deref(),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Providers => {
            list_providers(&manager.config(), &output);
            Ok(())
        }
        Commands::Config { validate: _ } => {
            show_config(&manager, &output);
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs share stderr with status lines; stdout is reserved for results
    let registry = tracing_subscriber::registry().with(filter);
    let result = if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

async fn ask(
    manager: &Arc<DelveConfigManager>,
    output: &Output,
    query: &str,
    selection: &SelectionArgs,
    json: bool,
) -> anyhow::Result<()> {
    let pipeline = ResearchPipeline::new(Arc::clone(manager));
    let model = selection.model.as_deref();
    let provider = selection.provider.as_deref();

    if json {
        let result = pipeline.run(query, model, provider).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output.step(1, 2, "Researching");
    let record = pipeline.run_research(query, model, provider).await?;
    if record.error.is_some() {
        output.warning("The model's research output could not be parsed; answering without sources");
    } else {
        output.success(&format!("Collected {} sources", record.sources.len()));
    }

    output.step(2, 2, "Writing answer");
    let answer = pipeline
        .synthesize_answer(query, &record, model, provider)
        .await?;

    let sources: Vec<String> = record.sources.iter().map(|s| s.url.clone()).collect();
    output.answer(&answer, &sources);
    Ok(())
}

fn list_providers(config: &DelveConfig, output: &Output) {
    let catalog = config.provider_catalog();
    if catalog.is_empty() {
        output.warning("No providers configured");
        output.hint("Add a [providers.<name>] section to delve.toml");
        return;
    }

    output.header("LLM Providers");
    for entry in catalog {
        output.provider(&entry.name, &entry.kind, entry.is_default);
        output.kv(
            "default model",
            entry.default_model.as_deref().unwrap_or("(none)"),
        );
        if entry.models.is_empty() {
            output.info("no model list configured");
        }
        for model in &entry.models {
            output.list_item(model);
        }
    }
}

fn show_config(manager: &DelveConfigManager, output: &Output) {
    let config = manager.config();

    output.header("Configuration");
    if let Some(path) = manager.path() {
        output.kv("file", &path.display().to_string());
    }
    output.kv("default provider", &config.llm.default_provider);
    output.kv(
        "default model",
        config.llm.default_model.as_deref().unwrap_or("(provider default)"),
    );
    output.kv("log level", &config.logging.level);

    output.header("Prompts");
    output.kv("researcher", &config.prompts.researcher.display().to_string());
    output.kv("synthesizer", &config.prompts.synthesizer.display().to_string());
    output.kv(
        "rewriter",
        &config
            .prompts
            .rewriter
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in)".to_string()),
    );

    output.header("Search & Fetch");
    output.kv("search tool", &config.search.tool);
    output.kv("max results", &config.search.max_results.to_string());
    output.kv("fetch workers", &config.fetch.max_workers.to_string());
    output.kv("fetch timeout", &format!("{}s", config.fetch.timeout_secs));
    output.kv("content chars", &config.fetch.content_chars.to_string());
    output.kv(
        "rewrite fallback",
        &config.research.rewrite_fallback.to_string(),
    );
}

fn validate_config(path: &Path, output: &Output) -> anyhow::Result<()> {
    match DelveConfig::load(path) {
        Ok(config) => {
            output.success(&format!("{} is valid", path.display()));
            for (name, provider) in &config.providers {
                if config.resolve_env(provider.api_key_env()).is_none() {
                    output.warning(&format!(
                        "Provider '{}': {} is not set",
                        name,
                        provider.api_key_env()
                    ));
                }
            }
            Ok(())
        }
        Err(e) => {
            output.error(&format!("{}: {}", path.display(), e));
            anyhow::bail!("configuration is invalid")
        }
    }
}
