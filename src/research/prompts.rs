use crate::types::{AppError, FetchedDocument, ResearchRecord, Result};
use crate::utils::text::truncate_chars;
use std::path::{Path, PathBuf};

/// Resolve a template path.
///
/// Relative paths are taken relative to the directory holding the
/// configuration file when there is one, otherwise the working directory.
pub fn resolve_template_path(config_path: Option<&Path>, template: &Path) -> PathBuf {
    if template.is_absolute() {
        return template.to_path_buf();
    }

    match config_path.and_then(Path::parent) {
        Some(dir) => dir.join(template),
        None => template.to_path_buf(),
    }
}

/// Read a prompt template from disk
pub async fn load_template(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Configuration(format!(
            "Failed to read prompt template {}: {}",
            path.display(),
            e
        ))
    })
}

/// Context block for the research prompt.
///
/// Each document contributes its URL, title and at most `content_chars`
/// characters of content.
pub fn build_context(documents: &[FetchedDocument], content_chars: usize) -> String {
    documents
        .iter()
        .map(|doc| {
            format!(
                "URL: {}\nTitle: {}\nContent: {}",
                doc.url,
                doc.title,
                truncate_chars(&doc.content, content_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn research_user_prompt(query: &str, context: &str) -> String {
    format!(
        "User Query: {}\n\nWeb Search Results:\n---\n{}\n---\nPlease analyze the provided search results and generate the JSON output as per the schema.",
        query, context
    )
}

pub fn answer_user_prompt(query: &str, record: &ResearchRecord) -> Result<String> {
    let research_json = serde_json::to_string_pretty(record)
        .map_err(|e| AppError::Internal(format!("Failed to serialize research data: {}", e)))?;

    Ok(format!(
        "User Query: {}\n\nResearch Data:\n---\n{}",
        query, research_json
    ))
}
