//! services/api/src/web/middleware.rs
//!
//! Credential gate for every model-backed route.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Middleware that blocks the request until an OpenAI API key is configured.
///
/// If one is, the active `Assistant` is inserted into request extensions for handlers to use.
pub async fn require_credential(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let assistant = state
        .active_assistant()
        .await
        .ok_or(ApiError::MissingCredential)?;

    req.extensions_mut().insert(assistant);

    Ok(next.run(req).await)
}
