//! PDF text extraction.
//!
//! Text is taken page by page with `lopdf`. When every page comes back
//! empty the whole document is retried with `pdf-extract`, which handles
//! more font encodings. Encrypted documents are reported, not decrypted.

use bundle_insights_core::InsightClassifier;

use super::{text_sample, DocumentPayload};
use crate::config::ParsingConfig;
use crate::error::ParseError;

pub fn parse(
    bytes: &[u8],
    classifier: &InsightClassifier,
    config: &ParsingConfig,
) -> Result<DocumentPayload, ParseError> {
    let document = match lopdf::Document::load_mem(bytes) {
        Ok(document) => document,
        Err(e) if declares_encryption(bytes) => {
            tracing::debug!(error = %e, "encrypted PDF could not be opened");
            return Err(ParseError::Encrypted);
        }
        Err(e) => return Err(e.into()),
    };
    if document.is_encrypted() {
        return Err(ParseError::Encrypted);
    }

    let pages = document.get_pages();
    let mut text = String::new();
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => {
                if !text.is_empty() && !page_text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&page_text);
            }
            Err(e) => {
                tracing::debug!(page = page_number, error = %e, "page text extraction failed, page skipped")
            }
        }
    }

    if text.trim().is_empty() && !pages.is_empty() {
        if let Some(fallback) = extract_whole_document(bytes) {
            text = fallback;
        }
    }

    let text = text.trim();
    Ok(DocumentPayload {
        page_count: pages.len(),
        char_count: text.chars().count(),
        text_sample: text_sample(text, config.text_sample_chars),
        insights: classifier.classify_text(text),
    })
}

/// True when the file carries an `/Encrypt` dictionary reference, whether
/// in a classic trailer or an xref stream dictionary.
fn declares_encryption(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}

/// `pdf-extract` panics on some malformed font programs.
fn extract_whole_document(bytes: &[u8]) -> Option<String> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "pdf-extract fallback failed");
            None
        }
        Err(_) => {
            tracing::warn!("pdf-extract fallback panicked");
            None
        }
    }
}
