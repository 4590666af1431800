// leettools-mcp-core/src/operations.rs

//! The catalog of operations the adapter can run.
//!
//! Each [`Operation`] variant knows its tool name, its `leet` argument list and the
//! [`CommandOptions`] the dispatcher needs to interpret the run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{ErrorCode, ErrorEnvelope};
use crate::processors::{KnowledgeBaseListParser, NoopProcessor, StdoutProcessor};

pub const DEFAULT_KB_NAME: &str = "mcp_search";
pub const DEFAULT_SEARCH_MAX_RESULTS: u32 = 10;
pub const DEFAULT_SEARCH_ITERATION: u32 = 1;
pub const DEFAULT_DAYS_LIMIT: u32 = 30;

pub const LOG_LEVEL_DEBUG: &str = "DEBUG";

const PREFIX_WEB_SEARCH: &str = "web_search";
const PREFIX_KB_SEARCH: &str = "kb_search";
const PREFIX_KB_OPS: &str = "kb_ops";
const PREFIX_EXTRACT: &str = "extract";

/// Guidance attached to search results for the assistant presenting them.
pub const SEARCH_CITATIONS: &str = concat!(
    "When present the results, please show the references of the articles with title and full web link. ",
    "For references, only show relevant links for articles. Don't show links for images. ",
    "If the full web link is not available, then don't show that reference."
);

/// How the dispatcher should treat one run. Built fresh per call and never mutated.
#[derive(Clone)]
pub struct CommandOptions {
    pub output_prefix: String,
    pub error_code: ErrorCode,
    pub instructions: Option<String>,
    pub no_results_message: Option<String>,
    pub no_results_code: Option<ErrorCode>,
    pub read_output_file: bool,
    pub no_stdout_return: bool,
    pub no_stderr_return: bool,
    pub stdout_processor: Arc<dyn StdoutProcessor>,
}

impl fmt::Debug for CommandOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandOptions")
            .field("output_prefix", &self.output_prefix)
            .field("error_code", &self.error_code)
            .field("instructions", &self.instructions.is_some())
            .field("no_results_message", &self.no_results_message)
            .field("no_results_code", &self.no_results_code)
            .field("read_output_file", &self.read_output_file)
            .field("no_stdout_return", &self.no_stdout_return)
            .field("no_stderr_return", &self.no_stderr_return)
            .finish_non_exhaustive()
    }
}

impl CommandOptions {
    /// Options for a command whose only product is its exit status and stdout.
    pub fn new(output_prefix: impl Into<String>, error_code: ErrorCode) -> Self {
        Self {
            output_prefix: output_prefix.into(),
            error_code,
            instructions: None,
            no_results_message: None,
            no_results_code: None,
            read_output_file: false,
            no_stdout_return: true,
            no_stderr_return: true,
            stdout_processor: Arc::new(NoopProcessor),
        }
    }

    pub fn for_kb_search(kb_name: &str) -> Self {
        Self {
            instructions: Some(SEARCH_CITATIONS.to_string()),
            no_results_message: Some("No knowledge base results found".to_string()),
            no_results_code: Some(ErrorCode::NoKbResults),
            read_output_file: true,
            ..Self::new(format!("{}_{}", PREFIX_KB_SEARCH, kb_name), ErrorCode::KbSearchFailed)
        }
    }

    pub fn for_web_search(kb_name: &str) -> Self {
        Self {
            instructions: Some(SEARCH_CITATIONS.to_string()),
            no_results_message: Some("No web search results found".to_string()),
            no_results_code: Some(ErrorCode::NoWebSearchResults),
            read_output_file: true,
            ..Self::new(format!("{}_{}", PREFIX_WEB_SEARCH, kb_name), ErrorCode::WebSearchFailed)
        }
    }

    pub fn for_extract(kb_name: &str) -> Self {
        Self {
            instructions: Some(SEARCH_CITATIONS.to_string()),
            no_results_message: Some("No data extracted".to_string()),
            no_results_code: Some(ErrorCode::NoExtractResults),
            read_output_file: true,
            ..Self::new(format!("{}_{}", PREFIX_EXTRACT, kb_name), ErrorCode::ExtractFailed)
        }
    }

    pub fn for_kb_operation(operation: &str) -> Self {
        Self::new(format!("{}_{}", PREFIX_KB_OPS, operation), ErrorCode::KbOperationFailed)
    }

    pub fn with_stdout_processor(mut self, processor: Arc<dyn StdoutProcessor>) -> Self {
        self.stdout_processor = processor;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListKnowledgeBases,
    SearchKnowledgeBase {
        query: String,
        kb_name: String,
    },
    SearchWeb {
        query: String,
        max_results: u32,
        iterations: u32,
        kb_name: String,
    },
    CreateKnowledgeBase {
        kb_name: String,
    },
    AddLocalFolder {
        local_path: PathBuf,
        kb_name: String,
    },
    ExtractStructuredData {
        query: String,
        schema_path: String,
        kb_name: String,
        days_limit: u32,
    },
}

impl Operation {
    /// Validates the folder and fills in a KB name derived from it when none is given.
    pub fn add_local_folder(
        local_path: impl Into<PathBuf>,
        kb_name: Option<String>,
    ) -> Result<Self, ErrorEnvelope> {
        let local_path = local_path.into();
        if !local_path.exists() {
            return Err(ErrorEnvelope::with_code(
                "Local path does not exist",
                format!("The specified path '{}' does not exist.", local_path.display()),
                ErrorCode::LocalPathNotFound,
            ));
        }
        let kb_name = kb_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| kb_name_from_path(&local_path));
        Ok(Operation::AddLocalFolder { local_path, kb_name })
    }

    /// Name of the MCP tool that exposes this operation.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Operation::ListKnowledgeBases => "list_kb",
            Operation::SearchKnowledgeBase { .. } => "kb_search",
            Operation::SearchWeb { .. } => "web_search",
            Operation::CreateKnowledgeBase { .. } => "create_kb",
            Operation::AddLocalFolder { .. } => "add_local_to_kb",
            Operation::ExtractStructuredData { .. } => "extract",
        }
    }

    /// Arguments passed to `leet`, without the `-o` output flag.
    pub fn args(&self) -> Vec<String> {
        match self {
            Operation::ListKnowledgeBases => vec!["kb".into(), "list".into()],
            Operation::SearchKnowledgeBase { query, kb_name } => vec![
                "flow".into(),
                "-t".into(),
                "search".into(),
                "-k".into(),
                kb_name.clone(),
                "-q".into(),
                query.clone(),
                "-p".into(),
                "retriever_type=local".into(),
            ],
            // Web results always land in the default KB; the caller's name only shapes the file prefix.
            Operation::SearchWeb {
                query,
                max_results,
                iterations,
                ..
            } => vec![
                "flow".into(),
                "-t".into(),
                "search".into(),
                "-k".into(),
                DEFAULT_KB_NAME.into(),
                "-q".into(),
                query.clone(),
                "-p".into(),
                format!("search_max_results={}", max_results),
                "-p".into(),
                format!("search_iteration={}", iterations),
            ],
            Operation::CreateKnowledgeBase { kb_name } => {
                vec!["kb".into(), "create".into(), "-k".into(), kb_name.clone()]
            }
            Operation::AddLocalFolder { local_path, kb_name } => vec![
                "kb".into(),
                "add-local".into(),
                "-p".into(),
                local_path.to_string_lossy().into_owned(),
                "-k".into(),
                kb_name.clone(),
                "-l".into(),
                LOG_LEVEL_DEBUG.into(),
            ],
            Operation::ExtractStructuredData {
                query,
                schema_path,
                kb_name,
                days_limit,
            } => vec![
                "flow".into(),
                "-t".into(),
                "extract".into(),
                "-k".into(),
                kb_name.clone(),
                "-q".into(),
                query.clone(),
                "-p".into(),
                format!("extract_pydantic={}", schema_path),
                "-p".into(),
                format!("days_limit={}", days_limit),
                "-p".into(),
                "extract_output_format=csv".into(),
            ],
        }
    }

    pub fn options(&self) -> CommandOptions {
        match self {
            Operation::ListKnowledgeBases => CommandOptions::for_kb_operation(self.tool_name())
                .with_stdout_processor(Arc::new(KnowledgeBaseListParser)),
            Operation::SearchKnowledgeBase { kb_name, .. } => CommandOptions::for_kb_search(kb_name),
            Operation::SearchWeb { kb_name, .. } => CommandOptions::for_web_search(kb_name),
            Operation::CreateKnowledgeBase { .. } | Operation::AddLocalFolder { .. } => {
                CommandOptions::for_kb_operation(self.tool_name())
            }
            Operation::ExtractStructuredData { kb_name, .. } => CommandOptions::for_extract(kb_name),
        }
    }
}

/// `"My Notes-2024.v2"` becomes `"my_notes_2024_v2"`.
pub fn kb_name_from_path(path: &Path) -> String {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_KB_NAME.to_string());
    base.replace([' ', '-', '.'], "_").to_lowercase()
}
