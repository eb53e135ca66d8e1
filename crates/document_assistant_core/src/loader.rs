//! crates/document_assistant_core/src/loader.rs
//!
//! Turns an uploaded file into a usable `Document`, or explains why it cannot.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::Document;
use crate::error::{AssistantResult, UnusableReason};
use crate::ports::PdfTextExtractor;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Extracted text shorter than this (in characters) is not usable.
pub const MIN_DOCUMENT_CHARS: usize = 50;

/// The file formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Resolves the kind from a declared MIME type, falling back to the file extension.
    pub fn detect(content_type: Option<&str>, file_name: &str) -> Result<Self, UnusableReason> {
        match content_type.map(|ct| ct.trim().to_ascii_lowercase()).as_deref() {
            Some("application/pdf") => return Ok(DocumentKind::Pdf),
            Some(ct) if ct.starts_with("text/plain") => return Ok(DocumentKind::PlainText),
            _ => {}
        }

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "txt" => Ok(DocumentKind::PlainText),
            _ => Err(UnusableReason::UnsupportedType(
                content_type
                    .filter(|ct| !ct.is_empty())
                    .map(str::to_string)
                    .unwrap_or(extension),
            )),
        }
    }
}

/// A raw upload as received at the boundary.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Validates uploads and extracts their text.
#[derive(Clone)]
pub struct DocumentLoader {
    pdf: Arc<dyn PdfTextExtractor>,
}

impl DocumentLoader {
    pub fn new(pdf: Arc<dyn PdfTextExtractor>) -> Self {
        Self { pdf }
    }

    /// Size and type checks run before any extraction work.
    pub fn load(&self, upload: &Upload) -> AssistantResult<Document> {
        if upload.bytes.is_empty() {
            return Err(UnusableReason::Empty.into());
        }
        if upload.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UnusableReason::TooLarge {
                size: upload.bytes.len(),
            }
            .into());
        }

        let kind = DocumentKind::detect(upload.content_type.as_deref(), &upload.file_name)?;
        let text = match kind {
            DocumentKind::Pdf => self.extract_pdf(&upload.bytes)?,
            DocumentKind::PlainText => extract_plain_text(&upload.bytes)?,
        };

        let chars = text.chars().count();
        if chars < MIN_DOCUMENT_CHARS {
            warn!(file = %upload.file_name, chars, "Extracted text is too short");
            return Err(UnusableReason::TooShort {
                chars,
                min: MIN_DOCUMENT_CHARS,
            }
            .into());
        }

        info!(file = %upload.file_name, ?kind, chars, "Document loaded");
        Ok(Document {
            name: upload.file_name.clone(),
            raw_text: text,
        })
    }

    fn extract_pdf(&self, bytes: &[u8]) -> Result<String, UnusableReason> {
        let pages = self
            .pdf
            .extract_pages(bytes)
            .map_err(|e| UnusableReason::ExtractionFailed(e.to_string()))?;

        let mut text = String::new();
        for page in &pages {
            text.push_str(page);
            text.push('\n');
        }
        Ok(text.replace("\n\n", "\n").trim().to_string())
    }
}

fn extract_plain_text(bytes: &[u8]) -> Result<String, UnusableReason> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| UnusableReason::ExtractionFailed(format!("file is not valid UTF-8 text: {}", e)))?;
    Ok(text.trim().to_string())
}
