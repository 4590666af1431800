// leettools-mcp-core/src/config.rs

//! Runtime configuration, read once from the environment at startup.

use std::path::{Path, PathBuf};

use crate::errors::LeetError;

pub const ENV_LEET_HOME: &str = "LEET_HOME";
pub const ENV_LEET_EXECUTABLE: &str = "LEET_EXECUTABLE";
pub const ENV_VIRTUAL_ENV: &str = "VIRTUAL_ENV";
pub const ENV_ENABLE_DEBUG_LOGGING: &str = "ENABLE_DEBUG_LOGGING";
pub const ENV_CONTEXT_LENGTH: &str = "CONTEXT_LENGTH";

/// Subdirectory of `LEET_HOME` that receives per-call output and log files.
pub const OUTPUT_DIR_NAME: &str = "mcp_outputs";

#[derive(Debug, Clone, PartialEq)]
pub struct LeetConfig {
    pub leet_home: PathBuf,
    pub output_dir: PathBuf,
    /// `LEET_EXECUTABLE`, used verbatim by the locator.
    pub executable_override: Option<PathBuf>,
    /// `VIRTUAL_ENV`, searched when `leet` is not on PATH.
    pub virtual_env: Option<PathBuf>,
    pub debug_logging: bool,
    /// Character cap applied to output file content.
    pub context_length: Option<usize>,
}

impl LeetConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, LeetError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LeetError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let leet_home = match get(ENV_LEET_HOME) {
            Some(raw) => expand_home(&raw),
            None => {
                let fallback = dirs::home_dir()
                    .unwrap_or_else(std::env::temp_dir)
                    .join("leettools");
                tracing::warn!(
                    fallback = %fallback.display(),
                    "{} is not set, LeetTools might not work correctly",
                    ENV_LEET_HOME
                );
                fallback
            }
        };

        let context_length = match get(ENV_CONTEXT_LENGTH) {
            Some(raw) => Some(raw.parse::<usize>().map_err(|e| {
                LeetError::config(format!(
                    "{} must be a non-negative integer, got '{}': {}",
                    ENV_CONTEXT_LENGTH, raw, e
                ))
            })?),
            None => None,
        };

        let debug_logging = get(ENV_ENABLE_DEBUG_LOGGING)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            output_dir: leet_home.join(OUTPUT_DIR_NAME),
            leet_home,
            executable_override: get(ENV_LEET_EXECUTABLE).map(PathBuf::from),
            virtual_env: get(ENV_VIRTUAL_ENV).map(PathBuf::from),
            debug_logging,
            context_length,
        })
    }

    /// Config rooted at `output_dir` directly, with nothing else set. Handy for embedding and tests.
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            leet_home: output_dir.parent().map(Path::to_path_buf).unwrap_or_else(|| output_dir.clone()),
            output_dir,
            executable_override: None,
            virtual_env: None,
            debug_logging: false,
            context_length: None,
        }
    }

    /// Creates the output directory if needed. Safe to call repeatedly.
    pub fn ensure_output_dir(&self) -> Result<(), LeetError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            LeetError::config(format!(
                "Failed to create output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;
        tracing::debug!(dir = %self.output_dir.display(), "Output directory ready");
        Ok(())
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}
