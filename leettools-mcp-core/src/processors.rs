// leettools-mcp-core/src/processors.rs

//! Turn captured stdout into extra fields on the success payload.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::LeetError;

/// Transforms captured stdout into fields merged into the outcome.
///
/// Errors are logged by the dispatcher and never fail the call.
pub trait StdoutProcessor: Send + Sync {
    fn process(&self, stdout: &str) -> Result<Map<String, Value>, LeetError>;
}

/// Adds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProcessor;

impl StdoutProcessor for NoopProcessor {
    fn process(&self, _stdout: &str) -> Result<Map<String, Value>, LeetError> {
        Ok(Map::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBaseEntry {
    pub org: String,
    pub kb: String,
    pub id: String,
}

/// Parses `leet kb list` lines such as `Org: org-default    KB: docs    ID: 6650...`
/// into a `knowledge_bases` array.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnowledgeBaseListParser;

const KB_LINE_PATTERN: &str = r"Org:\s*(?P<org>\S+)\s+KB:\s*(?P<kb>.+?)\s+ID:\s*(?P<id>\S+)";

static KB_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(KB_LINE_PATTERN).expect("knowledge base line pattern is valid"));

impl KnowledgeBaseListParser {
    pub fn parse(&self, stdout: &str) -> Vec<KnowledgeBaseEntry> {
        stdout
            .lines()
            .filter_map(|line| KB_LINE.captures(line))
            .map(|caps| KnowledgeBaseEntry {
                org: caps["org"].to_string(),
                kb: caps["kb"].trim().to_string(),
                id: caps["id"].to_string(),
            })
            .collect()
    }
}

impl StdoutProcessor for KnowledgeBaseListParser {
    fn process(&self, stdout: &str) -> Result<Map<String, Value>, LeetError> {
        let entries = self.parse(stdout);
        tracing::debug!(count = entries.len(), "Parsed knowledge base listing");
        let mut fields = Map::new();
        fields.insert("knowledge_bases".to_string(), serde_json::to_value(entries)?);
        Ok(fields)
    }
}
