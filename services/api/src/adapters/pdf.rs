//! services/api/src/adapters/pdf.rs
//!
//! Implements the `PdfTextExtractor` port with the `pdf-extract` crate.

use document_assistant_core::ports::{PdfTextExtractor, PortError, PortResult};

/// Extracts PDF text in memory. Pages are delimited by form feeds in the output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractAdapter;

impl PdfTextExtractor for PdfExtractAdapter {
    fn extract_pages(&self, bytes: &[u8]) -> PortResult<Vec<String>> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(text.split('\x0C').map(str::to_string).collect())
    }
}
