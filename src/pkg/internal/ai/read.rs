use std::io::Cursor;

use lopdf::Document;

use crate::prelude::{Error, Result};

/// Extracts the text of every page of a PDF. Pages that fail extraction
/// are skipped with a warning; an entirely unreadable document is an error
/// since there would be nothing to analyze.
pub fn extract_document(data: &[u8]) -> Result<String> {
    let cursor = Cursor::new(data);
    let doc = Document::load_from(cursor)
        .map_err(|e| Error::Pdf(format!("Failed to read the PDF file: {e}")))?;

    let pages = doc.get_pages();
    let mut text = String::new();

    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push(' ');
            }
            Err(e) => {
                tracing::warn!("failed to extract text from page {page_num}: {e}");
            }
        }
    }

    if text.trim().is_empty() {
        return Err(Error::Pdf(
            "No text could be extracted from the PDF file".into(),
        ));
    }
    Ok(text.trim().to_string())
}
