//! Paper sources.
//!
//! The [`Source`] trait is the seam between the tool handlers and the arXiv
//! API. [`ArxivSource`] talks to export.arxiv.org; [`MockSource`] serves
//! canned papers for tests and offline use.

mod arxiv;
pub mod mock;

pub use arxiv::{build_search_query, ArxivSource, ARXIV_API_URL, ARXIV_PDF_URL};
pub use mock::MockSource;

use crate::models::{Paper, PaperId, SearchQuery};
use async_trait::async_trait;

/// Interface for a paper source.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "arxiv")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Search for papers matching the query, newest first
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, SourceError>;

    /// Fetch metadata for specific papers. Unknown ids are left out.
    async fn get_by_ids(&self, ids: &[PaperId]) -> Result<Vec<Paper>, SourceError>;

    /// Download a paper's PDF
    async fn fetch_pdf(&self, id: &PaperId) -> Result<Vec<u8>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing error (Atom feed)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Paper not found
    #[error("Paper not found: {0}")]
    NotFound(String),

    /// API error from the source
    #[error("API error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<feed_rs::parser::ParseFeedError> for SourceError {
    fn from(err: feed_rs::parser::ParseFeedError) -> Self {
        SourceError::Parse(format!("Failed to parse Atom feed: {}", err))
    }
}
