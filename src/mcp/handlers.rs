//! Handlers behind the four paper tools.

use std::sync::Arc;

use serde_json::Value;

use super::tools::{parse_args, ToolError, ToolHandler};
use crate::models::{
    file_uri, DownloadRequest, DownloadStatus, ListRequest, ListedPaper, PaperId, PaperListing,
    ReadRequest, ReadResult, SearchQuery, SearchRequest, SearchResponse, ToolOutput,
    DEFAULT_MAX_RESULTS,
};
use crate::sources::{Source, SourceError};
use crate::store::PaperStore;
use crate::utils::DateRange;

fn parse_paper_id(raw: &str) -> Result<PaperId, ToolError> {
    PaperId::parse(raw).map_err(|e| ToolError::InvalidInput(e.to_string()))
}

/// Handler for `search_papers`
#[derive(Debug)]
pub struct SearchPapersHandler {
    pub source: Arc<dyn Source>,
    /// Ceiling applied to the requested result count
    pub max_results: usize,
}

#[async_trait::async_trait]
impl ToolHandler for SearchPapersHandler {
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let request: SearchRequest = parse_args(args)?;

        let query = request.query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidInput("Query must not be empty".to_string()));
        }

        let range = DateRange::parse(request.date_from.as_deref(), request.date_to.as_deref())
            .map_err(|e| ToolError::InvalidInput(format!("Invalid date format - {}", e)))?;

        let max_results = request
            .max_results
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .min(self.max_results);

        tracing::debug!(
            "Searching {} for '{}' (max {}, categories {:?})",
            self.source.name(),
            query,
            max_results,
            request.categories
        );

        let search = SearchQuery::new(query)
            .max_results(max_results)
            .categories(request.categories);
        let papers: Vec<_> = self
            .source
            .search(&search)
            .await?
            .into_iter()
            .filter(|paper| range.contains(paper.published))
            .take(max_results)
            .collect();

        tracing::info!("Search for '{}' returned {} papers", query, papers.len());
        Ok(ToolOutput::Search(SearchResponse::new(papers)))
    }
}

/// Handler for `download_paper`
#[derive(Debug)]
pub struct DownloadPaperHandler {
    pub source: Arc<dyn Source>,
    pub store: PaperStore,
}

#[async_trait::async_trait]
impl ToolHandler for DownloadPaperHandler {
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let request: DownloadRequest = parse_args(args)?;
        let id = parse_paper_id(&request.paper_id)?;

        if self.store.contains(&id).await? {
            return Ok(ToolOutput::Download(DownloadStatus::available(
                &self.store.path_for(&id),
            )));
        }
        if request.check_status {
            return Ok(ToolOutput::Download(DownloadStatus::unknown(id.as_str())));
        }

        let pdf = match self.source.fetch_pdf(&id).await {
            Ok(bytes) => bytes,
            Err(SourceError::NotFound(message)) => return Err(ToolError::InvalidInput(message)),
            Err(e) => return Err(e.into()),
        };
        tracing::info!("Downloaded {} bytes of PDF for {}", pdf.len(), id);

        let stored = self.store.save_pdf(&id, pdf).await?;
        Ok(ToolOutput::Download(DownloadStatus::converted(&stored.path)))
    }
}

/// Handler for `list_papers`
#[derive(Debug)]
pub struct ListPapersHandler {
    pub source: Arc<dyn Source>,
    pub store: PaperStore,
}

#[async_trait::async_trait]
impl ToolHandler for ListPapersHandler {
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let _: ListRequest = parse_args(args)?;
        let stored = self.store.list().await?;

        let ids: Vec<PaperId> = stored.iter().map(|p| p.id.clone()).collect();
        let metadata = if ids.is_empty() {
            Vec::new()
        } else {
            // Metadata is a nicety; a stored paper is listed even offline.
            self.source.get_by_ids(&ids).await.unwrap_or_else(|e| {
                tracing::warn!("Metadata lookup for stored papers failed: {}", e);
                Vec::new()
            })
        };

        let papers = stored
            .into_iter()
            .map(|entry| {
                let paper = metadata.iter().find(|p| p.matches(&entry.id));
                ListedPaper {
                    id: entry.id.to_string(),
                    title: paper.map(|p| p.title.clone()),
                    authors: paper.map(|p| p.authors.clone()).unwrap_or_default(),
                    published: paper.and_then(|p| p.published),
                    resource_uri: file_uri(&entry.path),
                    size_bytes: entry.size_bytes,
                }
            })
            .collect();

        Ok(ToolOutput::List(PaperListing::new(papers)))
    }
}

/// Handler for `read_paper`
#[derive(Debug)]
pub struct ReadPaperHandler {
    pub store: PaperStore,
}

#[async_trait::async_trait]
impl ToolHandler for ReadPaperHandler {
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let request: ReadRequest = parse_args(args)?;
        let id = parse_paper_id(&request.paper_id)?;

        match self.store.read(&id).await? {
            Some(content) => Ok(ToolOutput::Read(ReadResult::success(id.as_str(), content))),
            None => Err(ToolError::InvalidInput(format!(
                "Paper {} not found in storage. You may need to download it first using download_paper.",
                id
            ))),
        }
    }
}
