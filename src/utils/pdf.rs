//! PDF text extraction utilities.
//!
//! Extraction goes through the pdf-extract crate and is CPU bound; async
//! callers should run it on the blocking pool.

use thiserror::Error;

/// Errors that can occur during PDF extraction
#[derive(Debug, Error)]
pub enum PdfExtractError {
    #[error("Failed to extract text from PDF: {0}")]
    ExtractionFailed(String),

    #[error("Not a valid PDF: {0}")]
    InvalidFile(String),

    #[error("PDF contains no extractable text")]
    Empty,
}

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extract text from PDF bytes held in memory.
pub fn extract_text_from_bytes(bytes: &[u8]) -> Result<String, PdfExtractError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(PdfExtractError::InvalidFile(
            "missing %PDF- header".to_string(),
        ));
    }

    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| PdfExtractError::ExtractionFailed(e.to_string()))?;

    if text.trim().is_empty() {
        // Scanned or image-only PDFs end up here
        tracing::debug!("Extracted empty text from PDF ({} bytes)", bytes.len());
        return Err(PdfExtractError::Empty);
    }

    Ok(normalize(&text))
}

/// Trim trailing whitespace per line and collapse runs of blank lines
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
