//! Tool registry for MCP tools.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::handlers::{
    DownloadPaperHandler, ListPapersHandler, ReadPaperHandler, SearchPapersHandler,
};
use crate::models::ToolOutput;
use crate::sources::{Source, SourceError};
use crate::store::{PaperStore, StoreError};

pub const SEARCH_PAPERS: &str = "search_papers";
pub const DOWNLOAD_PAPER: &str = "download_paper";
pub const LIST_PAPERS: &str = "list_papers";
pub const READ_PAPER: &str = "read_paper";

/// Errors raised by tool handlers
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Bad arguments; reported to the caller as an ordinary text result
    #[error("{0}")]
    InvalidInput(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The task running the tool panicked or was aborted
    #[error("Tool task failed: {0}")]
    Task(String),
}

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_papers")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

impl Tool {
    /// Run the handler. Invalid input comes back as
    /// [`ToolOutput::Rejected`]; only downstream failures are errors.
    pub async fn call(&self, args: Value) -> Result<ToolOutput, ToolError> {
        match self.handler.execute(args).await {
            Err(ToolError::InvalidInput(message)) => {
                tracing::debug!("{} rejected input: {}", self.name, message);
                Ok(ToolOutput::Rejected(message))
            }
            Err(e) => {
                tracing::warn!("{} failed: {}", self.name, e);
                Err(e)
            }
            ok => ok,
        }
    }

    /// `{name, description, inputSchema}` as listed to clients
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
        })
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError>;
}

/// Deserialize tool arguments; a missing argument object counts as `{}`
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|e| ToolError::InvalidInput(format!("Invalid arguments - {}", e)))
}

/// Registry of the paper tools, in listing order
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    /// Register search, download, list and read over a source and store
    pub fn new(source: Arc<dyn Source>, store: PaperStore, max_results: usize) -> Self {
        let mut registry = Self::default();

        registry.register(Tool {
            name: SEARCH_PAPERS.to_string(),
            description: "Search for papers on arXiv with advanced filtering".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query; plain words or arXiv field syntax (ti:, au:, abs:, cat:)"
                    },
                    "max_results": {
                        "type": "integer",
                        "description": format!("Maximum number of results (at most {})", max_results)
                    },
                    "date_from": {
                        "type": "string",
                        "description": "Earliest publication date, e.g. 2023-01-01"
                    },
                    "date_to": {
                        "type": "string",
                        "description": "Latest publication date, e.g. 2023-12-31"
                    },
                    "categories": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "arXiv categories to restrict to, e.g. cs.AI"
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(SearchPapersHandler {
                source: Arc::clone(&source),
                max_results,
            }),
        });

        registry.register(Tool {
            name: DOWNLOAD_PAPER.to_string(),
            description: "Download a paper and create a resource for it".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "paper_id": {
                        "type": "string",
                        "description": "The arXiv ID of the paper to download"
                    },
                    "check_status": {
                        "type": "boolean",
                        "description": "If true, only check whether the paper is already downloaded",
                        "default": false
                    }
                },
                "required": ["paper_id"]
            }),
            handler: Arc::new(DownloadPaperHandler {
                source: Arc::clone(&source),
                store: store.clone(),
            }),
        });

        registry.register(Tool {
            name: LIST_PAPERS.to_string(),
            description: "List all existing papers available as resources".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            handler: Arc::new(ListPapersHandler {
                source,
                store: store.clone(),
            }),
        });

        registry.register(Tool {
            name: READ_PAPER.to_string(),
            description: "Read the full content of a stored paper in markdown format".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "paper_id": {
                        "type": "string",
                        "description": "The arXiv ID of the paper to read"
                    }
                },
                "required": ["paper_id"]
            }),
            handler: Arc::new(ReadPaperHandler { store }),
        });

        registry
    }

    /// Register a tool, replacing any tool of the same name
    pub fn register(&mut self, tool: Tool) {
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get all tools
    pub fn all(&self) -> &[Tool] {
        &self.tools
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Descriptors of every tool
    pub fn descriptors(&self) -> Vec<Value> {
        self.tools.iter().map(Tool::descriptor).collect()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        tool.call(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockSource;

    fn registry() -> (tempfile::TempDir, ToolRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = ToolRegistry::new(
            Arc::new(MockSource::new()),
            PaperStore::new(dir.path()),
            50,
        );
        (dir, registry)
    }

    #[test]
    fn test_registry_lists_four_tools_in_order() {
        let (_dir, registry) = registry();
        let names: Vec<&str> = registry.all().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![SEARCH_PAPERS, DOWNLOAD_PAPER, LIST_PAPERS, READ_PAPER]);
    }

    #[test]
    fn test_descriptor_shape() {
        let (_dir, registry) = registry();
        let descriptor = registry.get(READ_PAPER).unwrap().descriptor();
        assert_eq!(descriptor["name"], READ_PAPER);
        assert!(descriptor["description"].is_string());
        assert_eq!(descriptor["inputSchema"]["required"][0], "paper_id");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error() {
        let (_dir, registry) = registry();
        let err = registry.execute("nope", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref name) if name == "nope"));
        assert_eq!(err.to_string(), "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_rejected_not_failed() {
        let (_dir, registry) = registry();
        let output = registry
            .execute(SEARCH_PAPERS, json!({"max_results": 3}))
            .await
            .unwrap();
        match output {
            ToolOutput::Rejected(message) => assert!(message.starts_with("Invalid arguments")),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_args_treats_null_as_empty_object() {
        let request: crate::models::ListRequest = parse_args(Value::Null).unwrap();
        assert_eq!(request, crate::models::ListRequest {});
    }
}
