// leettools-mcp-cli/src/models/cli.rs
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use leettools_mcp_core::operations::{
    DEFAULT_DAYS_LIMIT, DEFAULT_KB_NAME, DEFAULT_SEARCH_ITERATION, DEFAULT_SEARCH_MAX_RESULTS,
};
use leettools_mcp_core::{ErrorEnvelope, Operation};

/// Runs a single LeetTools MCP tool from the command line and prints its JSON payload.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase message verbosity.
    ///
    /// Specify multiple times for more verbose output:
    ///  -v:  INFO level
    ///  -vv: DEBUG level
    ///  -vvv: TRACE level (most verbose)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Pretty-print the JSON output and show the content separately.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Echo the raw payload to stderr.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// List local knowledge bases.
    #[command(name = "list_kb")]
    ListKb,

    /// Search a local knowledge base.
    #[command(name = "kb_search")]
    KbSearch {
        #[arg(short, long)]
        query: String,
        #[arg(short, long, default_value = DEFAULT_KB_NAME)]
        kb: String,
    },

    /// Search the web.
    #[command(name = "web_search")]
    WebSearch {
        #[arg(short, long)]
        query: String,
        #[arg(short, long, default_value = DEFAULT_KB_NAME)]
        kb: String,
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_MAX_RESULTS)]
        max_results: u32,
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_ITERATION)]
        iteration: u32,
    },

    /// Create a local knowledge base.
    #[command(name = "create_kb")]
    CreateKb {
        #[arg(short, long)]
        kb: String,
    },

    /// Add a local folder to a knowledge base.
    #[command(name = "add_local_to_kb")]
    AddLocalToKb {
        #[arg(short = 'p', long)]
        local_path: PathBuf,
        /// Derived from the folder name when omitted.
        #[arg(short, long)]
        kb: Option<String>,
    },

    /// Extract structured data from a knowledge base.
    #[command(name = "extract")]
    Extract {
        #[arg(short, long)]
        query: String,
        /// Pydantic model file describing the extracted data.
        #[arg(long)]
        schema: String,
        #[arg(short, long, default_value = DEFAULT_KB_NAME)]
        kb: String,
        #[arg(long, default_value_t = DEFAULT_DAYS_LIMIT)]
        days_limit: u32,
    },
}

impl Commands {
    pub fn tool_name(&self) -> &'static str {
        match self {
            Commands::ListKb => "list_kb",
            Commands::KbSearch { .. } => "kb_search",
            Commands::WebSearch { .. } => "web_search",
            Commands::CreateKb { .. } => "create_kb",
            Commands::AddLocalToKb { .. } => "add_local_to_kb",
            Commands::Extract { .. } => "extract",
        }
    }

    /// Fails only for `add_local_to_kb` with a folder that does not exist.
    pub fn into_operation(self) -> Result<Operation, ErrorEnvelope> {
        Ok(match self {
            Commands::ListKb => Operation::ListKnowledgeBases,
            Commands::KbSearch { query, kb } => Operation::SearchKnowledgeBase { query, kb_name: kb },
            Commands::WebSearch {
                query,
                kb,
                max_results,
                iteration,
            } => Operation::SearchWeb {
                query,
                max_results,
                iterations: iteration,
                kb_name: kb,
            },
            Commands::CreateKb { kb } => Operation::CreateKnowledgeBase { kb_name: kb },
            Commands::AddLocalToKb { local_path, kb } => return Operation::add_local_folder(local_path, kb),
            Commands::Extract {
                query,
                schema,
                kb,
                days_limit,
            } => Operation::ExtractStructuredData {
                query,
                schema_path: schema,
                kb_name: kb,
                days_limit,
            },
        })
    }
}
