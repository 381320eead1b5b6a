//! PDF text extraction.
//!
//! Source files arrive as bytes; this module returns plain UTF-8 text.
//! Extraction errors never panic — the ingestion pipeline records them
//! and moves on to the next file.

use std::path::Path;

use crate::error::{ChatError, Result};
use crate::models::DocumentText;

/// Extract the text of a PDF file into a [`DocumentText`].
///
/// The `source` metadata is the file's name (not its full path), which is
/// what chunk citations display.
pub fn load_pdf(path: &Path) -> Result<DocumentText> {
    let bytes = std::fs::read(path)?;
    let text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| ChatError::InvalidRequest(format!("PDF extraction failed: {}", e)))?;

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(DocumentText { text, source })
}
