//! Paper model and arXiv identifiers.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Scheme used for paper resource URIs
pub const RESOURCE_SCHEME: &str = "arxiv://";

/// Error returned when a string is not a usable arXiv identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid arXiv paper id: '{0}'")]
pub struct InvalidPaperId(pub String);

/// A validated arXiv identifier.
///
/// Accepts new-style ids (`2301.12345`, `2301.12345v2`) and old-style ids
/// (`math.GT/0104020`, `hep-th/9901001v3`). Common wrappers such as an
/// `arXiv:` prefix or an `https://arxiv.org/abs/...` URL are stripped.
/// The version suffix is kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaperId(String);

fn new_style() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}\.\d{4,5}(v\d+)?$").expect("valid regex"))
}

fn old_style() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z][a-z\-]*(\.[A-Za-z\-]{2,})?/\d{7}(v\d+)?$").expect("valid regex")
    })
}

impl PaperId {
    /// Parse an arXiv ID from various formats
    pub fn parse(raw: &str) -> Result<Self, InvalidPaperId> {
        let trimmed = raw.trim();
        let mut id = trimmed;

        for marker in ["/abs/", "/pdf/"] {
            if let Some(pos) = id.find(marker) {
                id = &id[pos + marker.len()..];
                break;
            }
        }

        if id.get(..6).is_some_and(|prefix| prefix.eq_ignore_ascii_case("arxiv:")) {
            id = &id[6..];
        }
        let id = id.strip_suffix(".pdf").unwrap_or(id);

        if new_style().is_match(id) || old_style().is_match(id) {
            Ok(Self(id.to_string()))
        } else {
            Err(InvalidPaperId(trimmed.to_string()))
        }
    }

    /// Recover an id from a storage file stem (see [`PaperId::file_stem`])
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        if new_style().is_match(stem) {
            return Some(Self(stem.to_string()));
        }
        let restored = stem.replacen('_', "/", 1);
        old_style().is_match(&restored).then_some(Self(restored))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without its version suffix
    pub fn base(&self) -> &str {
        match self.0.rfind('v') {
            Some(pos)
                if pos + 1 < self.0.len() && self.0[pos + 1..].chars().all(|c| c.is_ascii_digit()) =>
            {
                &self.0[..pos]
            }
            _ => &self.0,
        }
    }

    /// File-system safe name: old-style ids contain a `/`
    pub fn file_stem(&self) -> String {
        self.0.replace('/', "_")
    }

    /// `arxiv://<id>` resource URI
    pub fn resource_uri(&self) -> String {
        format!("{}{}", RESOURCE_SCHEME, self.0)
    }
}

impl std::fmt::Display for PaperId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PaperId {
    type Error = InvalidPaperId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PaperId> for String {
    fn from(id: PaperId) -> Self {
        id.0
    }
}

/// A paper as returned by search.
///
/// Serialized with the field names clients of the search tool expect:
/// `id`, `title`, `authors`, `abstract`, `categories`, `published`, `url`
/// and `resource_uri`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Short arXiv id, version included (e.g. "2301.12345v1")
    pub id: String,

    /// Paper title with whitespace collapsed
    pub title: String,

    /// Author names in listed order
    pub authors: Vec<String>,

    /// Abstract text
    #[serde(rename = "abstract")]
    pub summary: String,

    /// arXiv category terms (e.g. "cs.AI")
    pub categories: Vec<String>,

    /// First submission time
    pub published: Option<DateTime<Utc>>,

    /// Direct PDF URL
    pub url: String,

    /// `arxiv://<id>`
    pub resource_uri: String,
}

impl Paper {
    /// Create a new paper with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            resource_uri: format!("{}{}", RESOURCE_SCHEME, id),
            id,
            title: title.into(),
            authors: Vec::new(),
            summary: String::new(),
            categories: Vec::new(),
            published: None,
            url: url.into(),
        }
    }

    /// Whether this paper is the same arXiv paper as `id`, ignoring versions
    pub fn matches(&self, id: &PaperId) -> bool {
        if self.id == id.as_str() {
            return true;
        }
        PaperId::parse(&self.id)
            .map(|own| own.base() == id.base())
            .unwrap_or(false)
    }
}

/// Builder for constructing Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a new builder with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            paper: Paper::new(id, title, url),
        }
    }

    /// Add an author
    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.paper.authors.push(name.into());
        self
    }

    /// Set all authors
    pub fn authors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paper.authors = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set abstract
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.paper.summary = summary.into();
        self
    }

    /// Add a category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.paper.categories.push(category.into());
        self
    }

    /// Set publication date
    pub fn published(mut self, published: DateTime<Utc>) -> Self {
        self.paper.published = Some(published);
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}
