//! Resume text extraction.
//!
//! Turns an uploaded document into plain text for the interview seed prompt.
//! Supported containers: PDF (via `pdf-extract`) and DOCX (via `zip`).
//! Pure functions only: nothing is retained after a call returns.

use std::fmt;
use std::path::Path;

use thiserror::Error;

pub mod docx;
pub mod pdf;

/// Document containers the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Resolves a declared extension (without the dot, any case).
    pub fn from_extension(extension: &str) -> Result<Self, ExtractionError> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            _ => Err(ExtractionError::UnsupportedFormat(extension.to_string())),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => f.write_str("PDF"),
            DocumentKind::Docx => f.write_str("DOCX"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Carries the rejected extension exactly as it appeared in the filename.
    #[error("Unsupported file type: .{0}. Please upload .pdf or .docx.")]
    UnsupportedFormat(String),

    /// The document parsed, but contained no text (e.g. a scanned PDF).
    #[error("Extracted text is empty. The file might be image-based or corrupt.")]
    EmptyExtraction,

    #[error("Error reading file: {kind} parser failed: {message}")]
    Unreadable { kind: DocumentKind, message: String },
}

impl ExtractionError {
    pub(crate) fn unreadable(kind: DocumentKind, cause: impl fmt::Display) -> Self {
        ExtractionError::Unreadable {
            kind,
            message: cause.to_string(),
        }
    }
}

/// Returns the extension of an uploaded filename without the dot, or `""`.
pub fn extension_of(filename: &str) -> &str {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}

/// Extracts the trimmed text content of a document.
///
/// Fails with `UnsupportedFormat` before looking at the bytes when the
/// extension is not `pdf` or `docx`, and with `EmptyExtraction` when the
/// document was readable but yielded only whitespace.
pub fn extract_text(bytes: &[u8], extension: &str) -> Result<String, ExtractionError> {
    let kind = DocumentKind::from_extension(extension)?;

    let raw = match kind {
        DocumentKind::Pdf => pdf::extract(bytes)?,
        DocumentKind::Docx => docx::extract(bytes)?,
    };

    let text = raw.trim();
    if text.is_empty() {
        return Err(ExtractionError::EmptyExtraction);
    }

    Ok(text.to_string())
}
