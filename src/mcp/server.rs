//! MCP server implementation using pmcp (Pragmatic AI's rust-mcp-sdk).
//!
//! Serves the paper tools and research prompts as JSON-RPC over stdio. Tool
//! results are returned in their structured form; invalid input is an
//! `Error: ...` string result, downstream failures become JSON-RPC internal
//! errors.

use std::collections::HashMap;
use std::sync::Arc;

use crate::mcp::prompts::{Prompt, PromptError, PromptRegistry};
use crate::mcp::tools::{Tool, ToolRegistry};
use async_trait::async_trait;
use pmcp::types::PromptInfo;
use pmcp::{
    Error, GetPromptResult, PromptHandler, RequestHandlerExtra, Server, ServerCapabilities,
    ToolHandler, ToolInfo,
};
use serde_json::Value;

/// The stdio MCP server for arXiv papers
#[derive(Debug)]
pub struct McpServer {
    server: Server,
}

impl McpServer {
    /// Create a server exposing every tool and prompt of the registries
    pub fn new(tools: &ToolRegistry, prompts: Arc<PromptRegistry>) -> Result<Self, pmcp::Error> {
        let mut builder = Server::builder()
            .name(env!("CARGO_PKG_NAME"))
            .version(env!("CARGO_PKG_VERSION"))
            .capabilities(ServerCapabilities::default());

        for tool in tools.all() {
            builder = builder.tool(tool.name.clone(), ToolWrapper { tool: tool.clone() });
        }
        for wrapper in PromptWrapper::for_registry(&prompts) {
            builder = builder.prompt(wrapper.prompt.name.clone(), wrapper);
        }

        Ok(Self {
            server: builder.build()?,
        })
    }

    /// Run until stdin closes
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!("Starting MCP server in stdio mode");
        self.server.run_stdio().await
    }
}

/// Wrapper for adapting our Tool to pmcp's ToolHandler
#[derive(Debug, Clone)]
struct ToolWrapper {
    tool: Tool,
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> Result<Value, Error> {
        self.tool
            .call(args)
            .await
            .map(|output| output.to_value())
            .map_err(|e| Error::internal(&e.to_string()))
    }

    fn metadata(&self) -> Option<ToolInfo> {
        Some(ToolInfo::new(
            self.tool.name.clone(),
            Some(self.tool.description.clone()),
            self.tool.input_schema.clone(),
        ))
    }
}

/// Adapts one prompt of the [`PromptRegistry`] to pmcp's PromptHandler.
///
/// The registry types share the MCP wire shape, so they convert to pmcp's
/// through serde.
#[derive(Debug, Clone)]
struct PromptWrapper {
    prompt: Prompt,
    registry: Arc<PromptRegistry>,
}

impl PromptWrapper {
    fn for_registry(registry: &Arc<PromptRegistry>) -> Vec<Self> {
        registry
            .all()
            .map(|prompt| PromptWrapper {
                prompt: prompt.clone(),
                registry: Arc::clone(registry),
            })
            .collect()
    }

    fn render(&self, args: &HashMap<String, String>) -> Result<GetPromptResult, Error> {
        let result = self
            .registry
            .render(&self.prompt.name, args)
            .map_err(|e| match e {
                PromptError::NotFound(_) => Error::not_found(e.to_string()),
                PromptError::MissingArgument { .. } => Error::invalid_params(e.to_string()),
            })?;
        serde_json::to_value(result)
            .and_then(serde_json::from_value)
            .map_err(|e| Error::internal(e.to_string()))
    }

    fn info(&self) -> Result<PromptInfo, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(&self.prompt)?)
    }
}

#[async_trait]
impl PromptHandler for PromptWrapper {
    async fn handle(
        &self,
        args: HashMap<String, String>,
        _extra: RequestHandlerExtra,
    ) -> Result<GetPromptResult, Error> {
        self.render(&args)
    }

    fn metadata(&self) -> Option<PromptInfo> {
        match self.info() {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!("Prompt {} has no listable metadata: {}", self.prompt.name, e);
                None
            }
        }
    }
}
