//! services/api/src/web/credentials.rs
//!
//! Operator endpoints for supplying the OpenAI API key at runtime.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::error::{ApiError, ErrorBody};
use crate::web::{
    protocol::{CredentialRequest, CredentialStatus},
    state::AppState,
};

/// GET /credentials - Report whether an API key is configured
#[utoipa::path(
    get,
    path = "/credentials",
    responses(
        (status = 200, description = "Credential status", body = CredentialStatus)
    )
)]
pub async fn credential_status_handler(
    State(state): State<Arc<AppState>>,
) -> Json<CredentialStatus> {
    Json(CredentialStatus {
        configured: state.active_assistant().await.is_some(),
    })
}

/// PUT /credentials - Supply or replace the OpenAI API key
#[utoipa::path(
    put,
    path = "/credentials",
    request_body = CredentialRequest,
    responses(
        (status = 200, description = "Credential installed", body = CredentialStatus),
        (status = 400, description = "Empty API key", body = ErrorBody)
    )
)]
pub async fn set_credential_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialRequest>,
) -> Result<(StatusCode, Json<CredentialStatus>), ApiError> {
    let api_key = req.api_key.trim();
    if api_key.is_empty() {
        return Err(ApiError::BadRequest("API key must not be empty".to_string()));
    }
    state.install_api_key(api_key).await;
    Ok((StatusCode::OK, Json(CredentialStatus { configured: true })))
}
