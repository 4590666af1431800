// leettools-mcp-server/src/handler.rs

//! MCP tool surface. Each tool builds an [`Operation`], hands it to the
//! dispatcher and returns the JSON payload as text content.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::schemars::{self, JsonSchema};
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_handler, tool_router};
use serde::{Deserialize, Serialize};
use tracing::info;

use leettools_mcp_core::operations::{
    DEFAULT_DAYS_LIMIT, DEFAULT_KB_NAME, DEFAULT_SEARCH_ITERATION, DEFAULT_SEARCH_MAX_RESULTS,
};
use leettools_mcp_core::{Dispatcher, LeetConfig, Operation, Response, serialize_response};

const SERVER_INSTRUCTIONS: &str = "LeetTools search and knowledge-base tools.\n\n\
    Tools:\n\
    • web_search: search the web and summarize the results\n\
    • kb_search: search a local knowledge base\n\
    • list_kb: list local knowledge bases\n\
    • create_kb: create a local knowledge base\n\
    • add_local_to_kb: add a local folder to a knowledge base\n\
    • extract: extract structured data from a knowledge base\n\n\
    Every tool returns a JSON document. Failures carry `\"error\": true` and a `code`.";

fn default_kb_name() -> String {
    DEFAULT_KB_NAME.to_string()
}

fn default_max_results() -> u32 {
    DEFAULT_SEARCH_MAX_RESULTS
}

fn default_iteration() -> u32 {
    DEFAULT_SEARCH_ITERATION
}

fn default_days_limit() -> u32 {
    DEFAULT_DAYS_LIMIT
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebSearchInput {
    #[schemars(description = "The search query")]
    pub query: String,

    #[serde(default = "default_max_results")]
    #[schemars(description = "Maximum search results to process (default: 10)")]
    pub search_max_results: u32,

    #[serde(default = "default_iteration")]
    #[schemars(description = "Number of search iterations to perform (default: 1)")]
    pub search_iteration: u32,

    #[serde(default = "default_kb_name")]
    #[schemars(description = "Name of the knowledge base (defaults to mcp_search)")]
    pub knowledge_base_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KbSearchInput {
    #[schemars(description = "The search query")]
    pub query: String,

    #[serde(default = "default_kb_name")]
    #[schemars(description = "Name of the knowledge base to search (defaults to mcp_search)")]
    pub knowledge_base_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateKbInput {
    #[schemars(description = "Name of the knowledge base to create")]
    pub knowledge_base_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddLocalInput {
    #[schemars(description = "Path to the local folder to add")]
    pub local_path: String,

    #[schemars(description = "Name of the knowledge base to add to (derived from the folder name when omitted)")]
    pub knowledge_base_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractInput {
    #[schemars(description = "The search query used to select relevant data")]
    pub query: String,

    #[schemars(description = "Full path of the Pydantic model python file describing the extracted data")]
    pub extract_pydantic: String,

    #[serde(default = "default_kb_name")]
    #[schemars(description = "Name of the knowledge base to search (defaults to mcp_search)")]
    pub knowledge_base_name: String,

    #[serde(default = "default_days_limit")]
    #[schemars(description = "Number of days to search back (default: 30)")]
    pub days_limit: u32,
}

#[derive(Clone)]
pub struct LeetToolsServer {
    dispatcher: Arc<Dispatcher>,
    tool_router: ToolRouter<Self>,
}

impl LeetToolsServer {
    pub fn new(config: Arc<LeetConfig>) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(config)),
            tool_router: Self::tool_router(),
        }
    }

    async fn run(&self, operation: Operation) -> CallToolResult {
        info!(tool = operation.tool_name(), "Tool called");
        let response = self.dispatcher.execute(&operation).await;
        to_call_result(operation.tool_name(), &response)
    }
}

/// Text content carrying the payload; envelopes are flagged as errors.
fn to_call_result(tool_name: &str, response: &Response) -> CallToolResult {
    let json = serialize_response(tool_name, response);
    if response.is_error() {
        CallToolResult::error(vec![Content::text(json)])
    } else {
        CallToolResult::success(vec![Content::text(json)])
    }
}

#[tool_router]
impl LeetToolsServer {
    #[tool(description = "Search the web for information on a topic using LeetTools.")]
    async fn web_search(&self, input: Parameters<WebSearchInput>) -> Result<CallToolResult, McpError> {
        let input = input.0;
        Ok(self
            .run(Operation::SearchWeb {
                query: input.query,
                max_results: input.search_max_results,
                iterations: input.search_iteration,
                kb_name: input.knowledge_base_name,
            })
            .await)
    }

    #[tool(description = "Search a local knowledge base for information on a topic.")]
    async fn kb_search(&self, input: Parameters<KbSearchInput>) -> Result<CallToolResult, McpError> {
        let input = input.0;
        Ok(self
            .run(Operation::SearchKnowledgeBase {
                query: input.query,
                kb_name: input.knowledge_base_name,
            })
            .await)
    }

    #[tool(
        description = "List all local knowledge bases using LeetTools. Each entry has the form `Org: <org-name>    KB: <kb-name>    ID: <kb-id>`."
    )]
    async fn list_kb(&self) -> Result<CallToolResult, McpError> {
        Ok(self.run(Operation::ListKnowledgeBases).await)
    }

    #[tool(description = "Create a local knowledge base using LeetTools.")]
    async fn create_kb(&self, input: Parameters<CreateKbInput>) -> Result<CallToolResult, McpError> {
        Ok(self
            .run(Operation::CreateKnowledgeBase {
                kb_name: input.0.knowledge_base_name,
            })
            .await)
    }

    #[tool(description = "Add files in a local folder to a knowledge base using LeetTools.")]
    async fn add_local_to_kb(&self, input: Parameters<AddLocalInput>) -> Result<CallToolResult, McpError> {
        let input = input.0;
        match Operation::add_local_folder(input.local_path, input.knowledge_base_name) {
            Ok(operation) => Ok(self.run(operation).await),
            Err(envelope) => Ok(to_call_result("add_local_to_kb", &Response::Error(envelope))),
        }
    }

    #[tool(description = "Extract structured data from a knowledge base based on a query and a time limit.")]
    async fn extract(&self, input: Parameters<ExtractInput>) -> Result<CallToolResult, McpError> {
        let input = input.0;
        Ok(self
            .run(Operation::ExtractStructuredData {
                query: input.query,
                schema_path: input.extract_pydantic,
                kb_name: input.knowledge_base_name,
                days_limit: input.days_limit,
            })
            .await)
    }
}

#[tool_handler]
impl rmcp::ServerHandler for LeetToolsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }
}
