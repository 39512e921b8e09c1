//! Utility modules supporting the paper tools.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts and user agent
//! - [`extract_text_from_bytes`]: PDF text extraction
//! - [`DateRange`] / [`parse_date`]: publication date filters for search

mod dates;
mod http;
mod pdf;

pub use dates::{parse_date, DateParseError, DateRange};
pub use http::{HttpClient, DEFAULT_TIMEOUT};
pub use pdf::{extract_text_from_bytes, PdfExtractError};
