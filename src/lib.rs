//! # arXiv MCP Server
//!
//! Search, download, list and read arXiv papers as MCP tools, served over
//! stdio JSON-RPC or over HTTP with a Server-Sent Events progress stream.
//!
//! ## Architecture
//!
//! - [`models`]: Papers, identifiers, tool requests and results
//! - [`sources`]: The arXiv API behind the [`Source`] trait
//! - [`store`]: Local storage of converted papers
//! - [`mcp`]: Tool and prompt registries and the stdio MCP server
//! - [`events`]: Progress events and the relay feeding SSE clients
//! - [`http`]: axum router, dispatch wrapper and SSE endpoint
//! - [`utils`]: HTTP client, PDF text extraction, date filters
//! - [`config`]: Layered settings

pub mod config;
pub mod events;
pub mod http;
pub mod mcp;
pub mod models;
pub mod sources;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use models::{Paper, PaperId};
pub use sources::Source;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
