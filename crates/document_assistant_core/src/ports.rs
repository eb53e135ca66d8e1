//! crates/document_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the hosted model API and of the PDF extraction library.

use async_trait::async_trait;

use crate::domain::ModelChoice;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, parsers).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("The model returned no text content")]
    EmptyResponse,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Request Types
//=========================================================================================

/// Everything the gateway needs for one chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: ModelChoice,
    pub system_instruction: String,
    pub user_content: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Sends one prompt to the hosted model and returns its raw reply text.
    /// A single round-trip: no retries, no streaming.
    async fn complete(&self, request: CompletionRequest) -> PortResult<String>;
}

pub trait PdfTextExtractor: Send + Sync {
    /// Extracts the text of every page of a PDF, in page order.
    fn extract_pages(&self, bytes: &[u8]) -> PortResult<Vec<String>>;
}
