//! MCP (Model Context Protocol) implementation.
//!
//! The tool and prompt registries are shared by both transports: the stdio
//! JSON-RPC [`McpServer`] and the HTTP/SSE server in [`crate::http`].

mod handlers;
pub mod prompts;
pub mod server;
pub mod tools;

pub use prompts::{Prompt, PromptError, PromptRegistry, PromptResult};
pub use server::McpServer;
pub use tools::{Tool, ToolError, ToolHandler, ToolRegistry};
