//! Tool results and the MCP content items they render to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DownloadStatus, PaperListing, ReadResult, SearchResponse};

/// A content item of a tool result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Content::Text { text } => text,
        }
    }
}

/// Outcome of a tool call that did not fail downstream.
///
/// `Rejected` carries an invalid-input message: it is returned to the
/// caller as an ordinary text result rather than a fault.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Search(SearchResponse),
    Download(DownloadStatus),
    List(PaperListing),
    Read(ReadResult),
    Rejected(String),
}

impl ToolOutput {
    pub fn is_rejected(&self) -> bool {
        matches!(self, ToolOutput::Rejected(_))
    }

    /// Number of items the result carries (papers for search and list)
    pub fn item_count(&self) -> usize {
        match self {
            ToolOutput::Search(response) => response.papers.len(),
            ToolOutput::List(listing) => listing.total_papers,
            ToolOutput::Download(_) | ToolOutput::Read(_) => 1,
            ToolOutput::Rejected(_) => 0,
        }
    }

    /// Structured JSON form of the result
    pub fn to_value(&self) -> Value {
        let value = match self {
            ToolOutput::Search(response) => serde_json::to_value(response),
            ToolOutput::Download(status) => serde_json::to_value(status),
            ToolOutput::List(listing) => serde_json::to_value(listing),
            ToolOutput::Read(result) => serde_json::to_value(result),
            ToolOutput::Rejected(message) => Ok(Value::String(error_text(message))),
        };
        value.unwrap_or_else(|e| Value::String(error_text(&e.to_string())))
    }

    /// Render as MCP content: one text item holding pretty JSON, or the
    /// `Error: ...` text of a rejected call
    pub fn into_content(self) -> Vec<Content> {
        let text = match &self {
            ToolOutput::Rejected(message) => error_text(message),
            _ => {
                let value = self.to_value();
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
        };
        vec![Content::text(text)]
    }
}

fn error_text(message: &str) -> String {
    format!("Error: {}", message)
}
