//! Tool request and response models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Paper;

/// Default number of search results when the caller does not ask for a count
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Arguments of the `search_papers` tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Search query; plain words or arXiv field syntax (`ti:`, `au:`, ...)
    pub query: String,

    /// Maximum number of results (clamped to the configured ceiling)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,

    /// Earliest publication date, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,

    /// Latest publication date, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,

    /// arXiv categories to restrict to (OR-combined)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

/// Search query passed to a [`Source`](crate::sources::Source)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text as given by the caller
    pub query: String,

    /// Category filter (OR-combined)
    pub categories: Vec<String>,

    /// Maximum number of results to return
    pub max_results: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            categories: Vec::new(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set category filter
    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }
}

/// Search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Number of papers returned
    pub total_results: usize,

    /// Papers found
    pub papers: Vec<Paper>,
}

impl SearchResponse {
    pub fn new(papers: Vec<Paper>) -> Self {
        Self {
            total_results: papers.len(),
            papers,
        }
    }
}

/// Arguments of the `download_paper` tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// arXiv id of the paper
    pub paper_id: String,

    /// Only report whether the paper is stored, never fetch
    #[serde(default)]
    pub check_status: bool,
}

impl DownloadRequest {
    /// Create a new download request
    pub fn new(paper_id: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            check_status: false,
        }
    }
}

/// State reported by `download_paper`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    Success,
    Unknown,
}

/// Result of a download operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadStatus {
    pub status: DownloadState,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_uri: Option<String>,
}

impl DownloadStatus {
    /// The paper was already in storage
    pub fn available(path: &Path) -> Self {
        Self {
            status: DownloadState::Success,
            message: "Paper already available".to_string(),
            resource_uri: Some(file_uri(path)),
        }
    }

    /// The paper was fetched and converted just now
    pub fn converted(path: &Path) -> Self {
        Self {
            status: DownloadState::Success,
            message: "Paper downloaded and converted".to_string(),
            resource_uri: Some(file_uri(path)),
        }
    }

    /// Status check for a paper that is not stored
    pub fn unknown(paper_id: &str) -> Self {
        Self {
            status: DownloadState::Unknown,
            message: format!("No download found for paper {}", paper_id),
            resource_uri: None,
        }
    }
}

/// Arguments of the `list_papers` tool (none)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {}

/// A stored paper as reported by `list_papers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedPaper {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,

    /// `file://` URI of the stored text
    pub resource_uri: String,

    /// Size of the stored text in bytes
    pub size_bytes: u64,
}

/// Result of `list_papers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperListing {
    pub total_papers: usize,
    pub papers: Vec<ListedPaper>,
}

impl PaperListing {
    pub fn new(papers: Vec<ListedPaper>) -> Self {
        Self {
            total_papers: papers.len(),
            papers,
        }
    }
}

/// Arguments of the `read_paper` tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadRequest {
    /// arXiv id of a previously downloaded paper
    pub paper_id: String,
}

impl ReadRequest {
    /// Create a new read request
    pub fn new(paper_id: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
        }
    }
}

/// Result of a paper read operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResult {
    pub status: DownloadState,
    pub paper_id: String,
    /// Stored paper text
    pub content: String,
}

impl ReadResult {
    pub fn success(paper_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            status: DownloadState::Success,
            paper_id: paper_id.into(),
            content: content.into(),
        }
    }
}

/// `file://` URI for a local path
pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}
