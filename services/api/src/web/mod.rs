pub mod credentials;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use document_assistant_core::loader::MAX_UPLOAD_BYTES;
use std::sync::Arc;

pub use middleware::require_credential;
pub use rest::ApiDoc;
pub use state::AppState;

/// Leaves room for multipart framing so oversized files reach the loader's own size check.
pub(crate) const BODY_LIMIT_BYTES: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

/// Builds the API router. Every session route sits behind the credential gate.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no credential required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/models", get(rest::list_models_handler))
        .route(
            "/credentials",
            get(credentials::credential_status_handler).put(credentials::set_credential_handler),
        );

    // Session routes (credential required)
    let session_routes = Router::new()
        .route("/sessions", post(rest::create_session_handler))
        .route(
            "/sessions/{id}",
            get(rest::get_session_handler).delete(rest::reset_session_handler),
        )
        .route("/sessions/{id}/model", put(rest::select_model_handler))
        .route("/sessions/{id}/document", post(rest::upload_document_handler))
        .route("/sessions/{id}/summary", post(rest::summarize_handler))
        .route("/sessions/{id}/mode", put(rest::select_mode_handler))
        .route("/sessions/{id}/questions", post(rest::ask_handler))
        .route("/sessions/{id}/history", get(rest::history_handler))
        .route(
            "/sessions/{id}/quiz",
            get(rest::quiz_handler).post(rest::generate_quiz_handler),
        )
        .route("/sessions/{id}/quiz/answer", post(rest::submit_answer_handler))
        .route("/sessions/{id}/quiz/previous", post(rest::previous_question_handler))
        .route("/sessions/{id}/quiz/results", get(rest::quiz_results_handler))
        .route("/sessions/{id}/quiz/retry", post(rest::retry_quiz_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_credential,
        ));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(app_state)
}
