//! Core data models for papers and tool requests.

mod output;
mod paper;
mod search;

pub use output::{Content, ToolOutput};
pub use paper::{InvalidPaperId, Paper, PaperBuilder, PaperId, RESOURCE_SCHEME};
pub use search::{
    file_uri, DownloadRequest, DownloadState, DownloadStatus, ListRequest, ListedPaper,
    PaperListing, ReadRequest, ReadResult, SearchQuery, SearchRequest, SearchResponse,
    DEFAULT_MAX_RESULTS,
};
