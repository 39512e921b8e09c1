//! Mock source for testing purposes.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::models::{Paper, PaperBuilder, PaperId, SearchQuery};
use crate::sources::{Source, SourceError};

/// A mock source that serves predefined papers and PDFs.
#[derive(Debug, Default)]
pub struct MockSource {
    papers: Vec<Paper>,
    pdfs: HashMap<String, Vec<u8>>,
    failure: Option<String>,
    delay: Option<Duration>,
    last_query: Mutex<Option<SearchQuery>>,
}

impl MockSource {
    /// Create a new mock source with no papers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Papers returned by every search (and by id lookups).
    pub fn with_papers(mut self, papers: Vec<Paper>) -> Self {
        self.papers = papers;
        self
    }

    /// PDF bytes served for a paper id.
    pub fn with_pdf(mut self, paper_id: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.pdfs.insert(paper_id.to_string(), bytes.into());
        self
    }

    /// Make every call fail with an API error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Make every search take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The query of the most recent search, if any.
    pub fn last_query(&self) -> Option<SearchQuery> {
        self.last_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check_failure(&self) -> Result<(), SourceError> {
        match &self.failure {
            Some(message) => Err(SourceError::Api(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, SourceError> {
        *self.last_query.lock().unwrap_or_else(PoisonError::into_inner) = Some(query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check_failure()?;
        Ok(self
            .papers
            .iter()
            .take(query.max_results)
            .cloned()
            .collect())
    }

    async fn get_by_ids(&self, ids: &[PaperId]) -> Result<Vec<Paper>, SourceError> {
        self.check_failure()?;
        Ok(self
            .papers
            .iter()
            .filter(|paper| ids.iter().any(|id| paper.matches(id)))
            .cloned()
            .collect())
    }

    async fn fetch_pdf(&self, id: &PaperId) -> Result<Vec<u8>, SourceError> {
        self.check_failure()?;
        self.pdfs
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("No PDF for paper {} on arXiv", id)))
    }
}

/// Helper function to create a mock paper for testing.
///
/// The paper is dated 2023-01-15T10:00:00Z.
pub fn make_paper(id: &str, title: &str) -> Paper {
    let builder = PaperBuilder::new(id, title, format!("http://arxiv.org/pdf/{}", id))
        .author("Test Author")
        .summary(format!("Abstract of {}", title))
        .category("cs.AI");

    match Utc.with_ymd_and_hms(2023, 1, 15, 10, 0, 0).single() {
        Some(published) => builder.published(published).build(),
        None => builder.build(),
    }
}
