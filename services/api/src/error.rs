//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and how each
//! error is rendered to the client as a JSON message.

use crate::config::ConfigError;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use document_assistant_core::{AssistantError, UnusableReason};
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Shown whenever a model-backed route is used before an API key exists.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Please enter your OpenAI API key to continue";

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A domain error from the assistant; its message is already user-facing.
    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error("Failed to read the uploaded file: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("{}", MISSING_CREDENTIAL_MESSAGE)]
    MissingCredential,

    #[error("{0}")]
    BadRequest(String),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Assistant(err) => match err {
                AssistantError::DocumentUnusable(UnusableReason::TooLarge { .. }) => {
                    StatusCode::PAYLOAD_TOO_LARGE
                }
                AssistantError::DocumentUnusable(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AssistantError::ModelCallFailed { .. }
                | AssistantError::QuizGenerationInsufficient { .. } => StatusCode::BAD_GATEWAY,
                AssistantError::EmptySubmission | AssistantError::EmptyQuestion => {
                    StatusCode::BAD_REQUEST
                }
                AssistantError::NoDocument
                | AssistantError::WrongMode { .. }
                | AssistantError::InvalidQuizState(_)
                | AssistantError::NoPreviousQuestion => StatusCode::CONFLICT,
            },
            ApiError::Multipart(err) => err.status(),
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MissingCredential => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Config(_) | ApiError::Io(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, "Request failed: {}", self);
        } else {
            warn!(%status, "Request rejected: {}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
