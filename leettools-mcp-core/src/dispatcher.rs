// leettools-mcp-core/src/dispatcher.rs

//! Runs one operation end to end and produces exactly one payload.
//!
//! ```text
//! START -> LAUNCHED -> (FAILED | OUTPUT_READ) -> (ERROR | DONE)
//! ```
//!
//! Every call is a single attempt. Internal errors at any step become a
//! `<TOOL>_EXCEPTION` envelope instead of escaping to the transport.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::config::LeetConfig;
use crate::errors::{ErrorEnvelope, LeetError};
use crate::locator::{ExecutableLocator, ExecutableProbe, SystemProbe};
use crate::models::{ProcessOutcome, Response};
use crate::operations::{CommandOptions, LOG_LEVEL_DEBUG, Operation};
use crate::output::{ResolvedOutput, resolve_output};
use crate::runner::run_process;

pub const OUTPUT_SUFFIX: &str = "md";
pub const LOG_SUFFIX: &str = "log";

pub struct Dispatcher<P: ExecutableProbe = SystemProbe> {
    config: Arc<LeetConfig>,
    locator: ExecutableLocator<P>,
}

impl Dispatcher<SystemProbe> {
    pub fn new(config: Arc<LeetConfig>) -> Self {
        let locator = ExecutableLocator::from_config(&config);
        Self { config, locator }
    }
}

impl<P: ExecutableProbe> Dispatcher<P> {
    pub fn with_locator(config: Arc<LeetConfig>, locator: ExecutableLocator<P>) -> Self {
        Self { config, locator }
    }

    pub fn config(&self) -> &LeetConfig {
        &self.config
    }

    /// Runs a catalog operation.
    pub async fn execute(&self, operation: &Operation) -> Response {
        self.perform_response(operation.tool_name(), operation.args(), &operation.options())
            .await
    }

    /// Runs a catalog operation and serializes the result.
    pub async fn execute_json(&self, operation: &Operation) -> String {
        let response = self.execute(operation).await;
        serialize_response(operation.tool_name(), &response)
    }

    /// Runs `leet <args>` under `options` and serializes the result.
    pub async fn perform(&self, tool_name: &str, args: Vec<String>, options: &CommandOptions) -> String {
        let response = self.perform_response(tool_name, args, options).await;
        serialize_response(tool_name, &response)
    }

    pub async fn perform_response(
        &self,
        tool_name: &str,
        args: Vec<String>,
        options: &CommandOptions,
    ) -> Response {
        info!(tool = tool_name, "Performing operation");
        match self.dispatch(tool_name, args, options).await {
            Ok(response) => response,
            Err(e) => {
                error!(tool = tool_name, error = %e, "Exception while performing operation");
                Response::Error(ErrorEnvelope::exception(tool_name, e.to_string()))
            }
        }
    }

    async fn dispatch(
        &self,
        tool_name: &str,
        mut args: Vec<String>,
        options: &CommandOptions,
    ) -> Result<Response, LeetError> {
        let (output_path, log_path) = self.output_paths(&options.output_prefix);
        info!(output = %output_path.display(), log = %log_path.display(), "Prepared output paths");

        if options.read_output_file {
            args.push("-o".to_string());
            args.push(output_path.to_string_lossy().into_owned());
        }
        if self.config.debug_logging && !args.iter().any(|arg| arg == "-l") {
            args.push("-l".to_string());
            args.push(LOG_LEVEL_DEBUG.to_string());
        }

        let executable = self.locator.resolve();
        let mut outcome = run_process(&executable.path, &args, &log_path).await;
        if !outcome.success {
            return Ok(Response::Error(command_failure(tool_name, &outcome, options)));
        }

        if options.read_output_file {
            match resolve_output(&output_path, tool_name, options, self.config.context_length).await? {
                ResolvedOutput::NoResults(envelope) => return Ok(Response::Error(envelope)),
                ResolvedOutput::Content(content) => {
                    outcome.content = Some(content);
                    if let Some(instructions) = &options.instructions {
                        outcome.instructions = Some(instructions.clone());
                    }
                }
            }
        }

        let processed = outcome
            .stdout
            .as_deref()
            .filter(|stdout| !stdout.is_empty())
            .map(|stdout| options.stdout_processor.process(stdout));
        match processed {
            Some(Ok(fields)) if !fields.is_empty() => {
                outcome.merge_fields(fields);
                info!(tool = tool_name, "Processed stdout");
            }
            Some(Err(e)) => error!(tool = tool_name, error = %e, "Error processing stdout"),
            _ => {}
        }

        if options.no_stdout_return {
            outcome.stdout = None;
        }
        if options.no_stderr_return {
            outcome.stderr = None;
        }

        Ok(Response::Success(outcome))
    }

    /// `<prefix>_<YYYYMMDD_HHMMSS>_<8 hex>.md` and the matching `.log` under the output directory.
    ///
    /// The hex suffix keeps calls issued within the same second apart. Path separators
    /// in the prefix (from caller-supplied KB names) become `_`.
    pub fn output_paths(&self, prefix: &str) -> (PathBuf, PathBuf) {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let tie_breaker = Uuid::new_v4().simple().to_string();
        let stem = format!("{}_{}_{}", file_prefix(prefix), timestamp, &tie_breaker[..8]);
        (
            self.config.output_dir.join(format!("{}.{}", stem, OUTPUT_SUFFIX)),
            self.config.output_dir.join(format!("{}.{}", stem, LOG_SUFFIX)),
        )
    }
}

fn file_prefix(prefix: &str) -> String {
    prefix.replace(['/', '\\'], "_")
}

fn command_failure(tool_name: &str, outcome: &ProcessOutcome, options: &CommandOptions) -> ErrorEnvelope {
    let details = [outcome.stderr.as_deref(), outcome.error.as_deref()]
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
        .unwrap_or("Unknown error")
        .to_string();
    error!(tool = tool_name, details = %details, "Operation failed");
    ErrorEnvelope::new(format!("Error running {}", tool_name), details, options.error_code.as_str())
}

/// Serializes a response, falling back to an exception envelope if that fails.
pub fn serialize_response(tool_name: &str, response: &Response) -> String {
    response
        .to_json()
        .unwrap_or_else(|e| ErrorEnvelope::exception(tool_name, e.to_string()).to_json())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_output_paths_share_stem_and_differ_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = Dispatcher::new(Arc::new(LeetConfig::with_output_dir(dir.path())));

        let (out_a, log_a) = dispatcher.output_paths("kb_search_docs");
        let (out_b, log_b) = dispatcher.output_paths("kb_search_docs");

        assert_eq!(out_a.with_extension(""), log_a.with_extension(""));
        assert_eq!(out_a.extension().unwrap(), "md");
        assert_eq!(log_a.extension().unwrap(), "log");
        assert_ne!(out_a, out_b);
        assert_ne!(log_a, log_b);
        assert!(out_a.starts_with(dir.path()));
        assert!(
            out_a.file_name().unwrap().to_string_lossy().starts_with("kb_search_docs_"),
            "Unexpected name: {}",
            out_a.display()
        );
    }

    #[test]
    fn test_output_paths_flatten_separators_in_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = Dispatcher::new(Arc::new(LeetConfig::with_output_dir(dir.path())));

        let (out, log) = dispatcher.output_paths("kb_search_../../team\\notes");
        assert_eq!(out.parent().unwrap(), dir.path());
        assert_eq!(log.parent().unwrap(), dir.path());
        let name = out.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("kb_search_.._.._team_notes_"), "Unexpected name: {}", name);
    }

    #[test]
    fn test_command_failure_prefers_stderr_then_error() {
        let options = CommandOptions::for_kb_search("docs");
        let outcome = ProcessOutcome {
            stderr: Some("kb 'docs' not found\n".into()),
            ..Default::default()
        };
        let envelope = command_failure("kb_search", &outcome, &options);
        assert_eq!(envelope.message, "Error running kb_search");
        assert_eq!(envelope.details, "kb 'docs' not found\n");
        assert_eq!(envelope.code, ErrorCode::KbSearchFailed.as_str());

        let outcome = ProcessOutcome {
            stderr: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(command_failure("kb_search", &outcome, &options).details, "Unknown error");
    }
}
