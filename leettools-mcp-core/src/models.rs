// leettools-mcp-core/src/models.rs

//! Payloads returned to tool callers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ErrorEnvelope, LeetError};

/// Result of one run of the external executable, later enriched by the dispatcher.
///
/// All optional fields serialize as `null` when empty so callers always see the same keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub success: bool,
    pub log_path: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub content: Option<String>,
    pub instructions: Option<String>,
    /// Internal error text when the command could not be run at all.
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Failure code set by the runner itself (missing executable, spawn errors).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Fields contributed by a stdout processor.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProcessOutcome {
    /// Merges processor output. Known text fields are overwritten, anything else lands in `extra`.
    pub fn merge_fields(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            let slot = match key.as_str() {
                "content" => &mut self.content,
                "instructions" => &mut self.instructions,
                "stdout" => &mut self.stdout,
                "stderr" => &mut self.stderr,
                _ => {
                    self.extra.insert(key, value);
                    continue;
                }
            };
            match value {
                Value::String(text) => *slot = Some(text),
                Value::Null => *slot = None,
                other => *slot = Some(other.to_string()),
            }
        }
    }
}

/// What a tool call hands back: a success payload or exactly one envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(ProcessOutcome),
    Error(ErrorEnvelope),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// Compact JSON for success payloads, pretty JSON for envelopes.
    pub fn to_json(&self) -> Result<String, LeetError> {
        match self {
            Response::Success(outcome) => Ok(serde_json::to_string(outcome)?),
            Response::Error(envelope) => Ok(serde_json::to_string_pretty(envelope)?),
        }
    }

    /// Parses either payload shape; an object with `"error": true` is an envelope.
    pub fn parse(json: &str) -> Result<Self, LeetError> {
        let value: Value = serde_json::from_str(json)?;
        if value.get("error") == Some(&Value::Bool(true)) {
            Ok(Response::Error(serde_json::from_value(value)?))
        } else {
            Ok(Response::Success(serde_json::from_value(value)?))
        }
    }
}

impl From<ErrorEnvelope> for Response {
    fn from(envelope: ErrorEnvelope) -> Self {
        Response::Error(envelope)
    }
}
