//! arXiv research source implementation.

use async_trait::async_trait;
use feed_rs::parser;

use crate::models::{Paper, PaperBuilder, PaperId, SearchQuery};
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

/// Base URL for arXiv API
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";
/// Base URL for arXiv PDFs
pub const ARXIV_PDF_URL: &str = "https://arxiv.org/pdf";

/// Field prefixes that mark a query as already using arXiv syntax
const FIELD_PREFIXES: [&str; 5] = ["all:", "ti:", "abs:", "au:", "cat:"];

/// arXiv research source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    api_url: String,
    pdf_url: String,
}

impl ArxivSource {
    /// Create a new arXiv source against the public endpoints
    pub fn new(client: HttpClient) -> Self {
        Self::with_endpoints(client, ARXIV_API_URL, ARXIV_PDF_URL)
    }

    /// Create with custom endpoints (mirrors, tests)
    pub fn with_endpoints(
        client: HttpClient,
        api_url: impl Into<String>,
        pdf_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            pdf_url: pdf_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<Paper>, SourceError> {
        tracing::debug!("Querying arXiv: {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/atom+xml")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch arXiv results: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::Api(format!(
                "arXiv API returned status: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        let feed = parser::parse(bytes.as_ref())?;

        feed.entries
            .iter()
            .map(|entry| self.parse_entry(entry))
            .collect()
    }

    /// Parse arXiv Atom feed entry into Paper
    fn parse_entry(&self, entry: &feed_rs::model::Entry) -> Result<Paper, SourceError> {
        // Query errors come back as a single entry under /api/errors
        if entry.id.contains("/api/errors") {
            let message = entry
                .summary
                .as_ref()
                .map(|s| s.content.trim().to_string())
                .unwrap_or_else(|| "unknown arXiv query error".to_string());
            return Err(SourceError::Api(message));
        }

        let id = entry
            .id
            .rsplit_once("/abs/")
            .map(|(_, id)| id.trim())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SourceError::Parse(format!("Missing paper ID in '{}'", entry.id)))?
            .to_string();

        let title = entry
            .title
            .as_ref()
            .map(|t| collapse_whitespace(&t.content))
            .unwrap_or_default();

        let pdf_url = entry
            .links
            .iter()
            .find(|link| link.media_type.as_deref() == Some("application/pdf"))
            .map(|link| link.href.clone())
            .unwrap_or_else(|| format!("{}/{}", self.pdf_url, id));

        let mut builder = PaperBuilder::new(id, title, pdf_url)
            .authors(entry.authors.iter().map(|a| collapse_whitespace(&a.name)))
            .summary(
                entry
                    .summary
                    .as_ref()
                    .map(|s| collapse_whitespace(&s.content))
                    .unwrap_or_default(),
            );

        for category in &entry.categories {
            builder = builder.category(category.term.clone());
        }
        if let Some(published) = entry.published.or(entry.updated) {
            builder = builder.published(published);
        }

        Ok(builder.build())
    }
}

/// Build the arXiv `search_query` for a plain or field-prefixed query.
///
/// Plain queries are given `all:` prefixes so the API searches content
/// rather than matching loosely: a quoted phrase becomes `all:"..."`,
/// multiple words become `all:a AND all:b`. Categories are OR-combined and
/// ANDed with the query.
pub fn build_search_query(query: &str, categories: &[String]) -> String {
    let query = query.trim();

    let mut search = if FIELD_PREFIXES.iter().any(|prefix| query.contains(prefix)) {
        query.to_string()
    } else if query.contains('"') {
        format!("all:{}", query)
    } else {
        query
            .split_whitespace()
            .map(|term| format!("all:{}", term))
            .collect::<Vec<_>>()
            .join(" AND ")
    };

    let categories: Vec<String> = categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| format!("cat:{}", c))
        .collect();

    if !categories.is_empty() {
        search = format!("({}) AND ({})", search, categories.join(" OR "));
    }

    search
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, SourceError> {
        if query.query.trim().is_empty() {
            return Err(SourceError::InvalidRequest("Empty search query".to_string()));
        }

        let search_query = build_search_query(&query.query, &query.categories);
        let url = format!(
            "{}?search_query={}&start=0&max_results={}&sortBy=submittedDate&sortOrder=descending",
            self.api_url,
            urlencoding::encode(&search_query),
            query.max_results,
        );

        self.fetch_feed(&url).await
    }

    async fn get_by_ids(&self, ids: &[PaperId]) -> Result<Vec<Paper>, SourceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_list = ids.iter().map(PaperId::as_str).collect::<Vec<_>>().join(",");
        let url = format!(
            "{}?id_list={}&max_results={}",
            self.api_url,
            urlencoding::encode(&id_list),
            ids.len()
        );

        self.fetch_feed(&url).await
    }

    async fn fetch_pdf(&self, id: &PaperId) -> Result<Vec<u8>, SourceError> {
        let url = format!("{}/{}", self.pdf_url, id);
        tracing::debug!("Fetching PDF: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch PDF: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(format!("No PDF for paper {} on arXiv", id)));
        }
        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "arXiv PDF download returned status: {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read PDF: {}", e)))?;

        Ok(bytes.to_vec())
    }
}
