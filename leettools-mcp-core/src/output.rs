// leettools-mcp-core/src/output.rs

//! Reads the output file a command was asked to write with `-o`.

use std::path::Path;

use tracing::{info, warn};

use crate::errors::{ErrorEnvelope, LeetError};
use crate::operations::CommandOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedOutput {
    /// File text, possibly truncated. May be empty when the operation declares no "no results" message.
    Content(String),
    NoResults(ErrorEnvelope),
}

pub async fn resolve_output(
    path: &Path,
    tool_name: &str,
    options: &CommandOptions,
    context_length: Option<usize>,
) -> Result<ResolvedOutput, LeetError> {
    let has_content = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(e.into()),
    };

    let content = if has_content {
        let bytes = tokio::fs::read(path).await?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        info!(bytes = bytes.len(), path = %path.display(), "Read output file");
        text
    } else {
        warn!(path = %path.display(), "Output file empty or missing");
        String::new()
    };

    if content.is_empty() {
        if let Some(message) = &options.no_results_message {
            let code = options
                .no_results_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| format!("NO_{}_RESULTS", tool_name.to_uppercase()));
            return Ok(ResolvedOutput::NoResults(ErrorEnvelope::new(
                message.clone(),
                format!("The {} operation did not produce any content.", tool_name),
                code,
            )));
        }
        warn!(tool = tool_name, "No output produced and no 'no results' message declared, returning empty content");
    }

    Ok(ResolvedOutput::Content(match context_length {
        Some(limit) => {
            info!(limit, "Context length is defined, truncating content");
            truncate_chars(content, limit)
        }
        None => content,
    }))
}

/// Keeps the first `limit` characters.
pub fn truncate_chars(mut text: String, limit: usize) -> String {
    if let Some((byte_index, _)) = text.char_indices().nth(limit) {
        text.truncate(byte_index);
    }
    text
}
