// leettools-mcp-core/src/errors.rs
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised inside the adapter before they are turned into an [`ErrorEnvelope`].
#[derive(Error, Debug)]
pub enum LeetError {
    /// Bad or unreadable configuration (environment variables, output directory).
    #[error("Configuration Error: {0}")]
    Config(String),

    /// The executable could not be started.
    #[error("Failed to spawn '{}': {source}", executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem or pipe I/O failed.
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    /// A payload could not be serialized.
    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stdout post-processor rejected the captured output.
    #[error("Stdout Processor Error: {0}")]
    StdoutProcessor(String),
}

impl LeetError {
    pub fn config(msg: impl Into<String>) -> Self {
        LeetError::Config(msg.into())
    }

    pub fn processor(msg: impl Into<String>) -> Self {
        LeetError::StdoutProcessor(msg.into())
    }
}

/// Machine-readable failure codes shared with callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ExecutableNotFound,
    CommandExecutionError,
    KbOperationFailed,
    KbSearchFailed,
    WebSearchFailed,
    ExtractFailed,
    NoKbResults,
    NoWebSearchResults,
    NoExtractResults,
    LocalPathNotFound,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ExecutableNotFound => "EXECUTABLE_NOT_FOUND",
            ErrorCode::CommandExecutionError => "COMMAND_EXECUTION_ERROR",
            ErrorCode::KbOperationFailed => "KB_OPERATION_FAILED",
            ErrorCode::KbSearchFailed => "KB_SEARCH_FAILED",
            ErrorCode::WebSearchFailed => "WEB_SEARCH_FAILED",
            ErrorCode::ExtractFailed => "EXTRACT_FAILED",
            ErrorCode::NoKbResults => "NO_KB_RESULTS",
            ErrorCode::NoWebSearchResults => "NO_WEB_SEARCH_RESULTS",
            ErrorCode::NoExtractResults => "NO_EXTRACT_RESULTS",
            ErrorCode::LocalPathNotFound => "LOCAL_PATH_NOT_FOUND",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single failure shape every tool call can return.
///
/// `code` stays a string because internal failures use a per-tool
/// `<TOOL>_EXCEPTION` code that is not part of [`ErrorCode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: bool,
    pub message: String,
    pub details: String,
    pub code: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>, details: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            details: details.into(),
            code: code.into(),
        }
    }

    pub fn with_code(message: impl Into<String>, details: impl Into<String>, code: ErrorCode) -> Self {
        Self::new(message, details, code.as_str())
    }

    /// Envelope for an internal failure while performing `tool_name`.
    pub fn exception(tool_name: &str, details: impl Into<String>) -> Self {
        Self::new(
            format!("An error occurred performing {}", tool_name),
            details,
            format!("{}_EXCEPTION", tool_name.to_uppercase()),
        )
    }

    /// Pretty-printed JSON, two-space indent.
    pub fn to_json(&self) -> String {
        // Plain strings and a bool only.
        serde_json::to_string_pretty(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": true, \"message\": {:?}, \"details\": {:?}, \"code\": {:?}}}",
                self.message, self.details, self.code
            )
        })
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.message, self.details)
    }
}
