//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorBody};
use crate::web::{
    credentials,
    protocol::{
        AskRequest, ChatTurnView, CreateSessionRequest, CredentialRequest, CredentialStatus,
        DocumentInfo, HistoryResponse, ModeParam, ModelView, QuizQuestionView, QuizResultsView,
        QuizView, SelectModeRequest, SelectModelRequest, SessionView, SubmitAnswerRequest,
        SubmitAnswerResponse, SummaryResponse, UploadResponse,
    },
    state::AppState,
    BODY_LIMIT_BYTES,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    response::Json,
    Extension,
};
use document_assistant_core::{
    Assistant, AssistantError, ModelChoice, UnusableReason, Upload,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_models_handler,
        credentials::credential_status_handler,
        credentials::set_credential_handler,
        create_session_handler,
        get_session_handler,
        reset_session_handler,
        select_model_handler,
        upload_document_handler,
        summarize_handler,
        select_mode_handler,
        ask_handler,
        history_handler,
        generate_quiz_handler,
        quiz_handler,
        submit_answer_handler,
        previous_question_handler,
        quiz_results_handler,
        retry_quiz_handler,
    ),
    components(
        schemas(
            HealthResponse, ErrorBody, ModelView, CredentialRequest, CredentialStatus,
            CreateSessionRequest, SelectModelRequest, SelectModeRequest, ModeParam, AskRequest,
            SubmitAnswerRequest, SessionView, DocumentInfo, UploadResponse, SummaryResponse,
            ChatTurnView, HistoryResponse, QuizQuestionView, QuizView, SubmitAnswerResponse,
            QuizResultsView
        )
    ),
    tags(
        (name = "Document Assistant API", description = "Upload a document, ask grounded questions, and take a quiz on it.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    sessions: usize,
}

//=========================================================================================
// Service Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.sessions.count().await,
    })
}

/// List the models a session can be configured with.
#[utoipa::path(
    get,
    path = "/models",
    responses((status = 200, description = "Available models", body = [ModelView]))
)]
pub async fn list_models_handler(State(state): State<Arc<AppState>>) -> Json<Vec<ModelView>> {
    let default = state.config.default_model;
    Json(
        ModelChoice::all()
            .into_iter()
            .map(|model| ModelView::new(model, default))
            .collect(),
    )
}

//=========================================================================================
// Session Handlers
//=========================================================================================

fn parse_model(value: &str) -> Result<ModelChoice, ApiError> {
    value.parse::<ModelChoice>().map_err(ApiError::BadRequest)
}

/// Start a new, empty session.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionView),
        (status = 400, description = "Unknown model", body = ErrorBody),
        (status = 401, description = "No API key configured", body = ErrorBody)
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    // The body is optional; an empty request uses the configured default model.
    let req: CreateSessionRequest = if body.is_empty() {
        CreateSessionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };
    let model = match req.model.as_deref() {
        Some(value) => parse_model(value)?,
        None => state.config.default_model,
    };
    let handle = state.sessions.create(model).await;
    let session = handle.lock().await;
    Ok((StatusCode::CREATED, Json(SessionView::from(&*session))))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionView),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

/// Clear the document, summary, history and quiz. The model choice is kept.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session reset", body = SessionView),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn reset_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    session.reset();
    info!(session_id = %id, "Session reset");
    Ok(Json(SessionView::from(&*session)))
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/model",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SelectModelRequest,
    responses(
        (status = 200, description = "Model changed", body = SessionView),
        (status = 400, description = "Unknown model", body = ErrorBody),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn select_model_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectModelRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let model = parse_model(&req.model)?;
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    session.model = model;
    Ok(Json(SessionView::from(&*session)))
}

//=========================================================================================
// Document Handlers
//=========================================================================================

/// Upload a PDF or TXT document, replacing anything the session held, and summarize it.
///
/// Accepts a multipart/form-data request with a single file part.
#[utoipa::path(
    post,
    path = "/sessions/{id}/document",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body(content_type = "multipart/form-data", description = "The document to upload."),
    responses(
        (status = 201, description = "Document loaded", body = UploadResponse),
        (status = 400, description = "Missing file part", body = ErrorBody),
        (status = 413, description = "File larger than 10MB", body = ErrorBody),
        (status = 422, description = "Empty, unsupported or unreadable document", body = ErrorBody)
    )
)]
pub async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    Extension(assistant): Extension<Assistant>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let handle = state.sessions.get(id).await?;
    let declared_len = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    // Text parts before the file are skipped.
    let field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| upload_error(e, declared_len))?
        {
            Some(field) if field.file_name().is_some() => break field,
            Some(_) => continue,
            None => {
                return Err(ApiError::BadRequest(
                    "Multipart form must include a file".to_string(),
                ))
            }
        }
    };
    let file_name = field.file_name().unwrap_or("untitled.txt").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| upload_error(e, declared_len))?;
    let upload = Upload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    };

    // Extraction is CPU-bound and the PDF library may panic on malformed input.
    let loader = state.loader.clone();
    let document = tokio::task::spawn_blocking(move || loader.load(&upload))
        .await
        .map_err(|e| {
            AssistantError::from(UnusableReason::ExtractionFailed(format!(
                "extraction aborted: {}",
                e
            )))
        })??;

    let mut session = handle.lock().await;
    assistant.load_document(&mut session, document);
    let summary_error = match assistant.summarize(&mut session).await {
        Ok(_) => None,
        Err(e) => {
            warn!(session_id = %id, "Document loaded without summary: {}", e);
            Some(e.to_string())
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            session: SessionView::from(&*session),
            summary_error,
        }),
    ))
}

/// A body that trips the request limit is reported as an oversized file, not a parse failure.
fn upload_error(err: MultipartError, declared_len: Option<usize>) -> ApiError {
    let over_limit = declared_len.is_some_and(|len| len > BODY_LIMIT_BYTES);
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE || over_limit {
        // Without a Content-Length the body is only known to exceed the limit.
        let size = declared_len.unwrap_or(BODY_LIMIT_BYTES + 1);
        return AssistantError::from(UnusableReason::TooLarge { size }).into();
    }
    ApiError::Multipart(err)
}

/// Re-generate the summary of the loaded document.
#[utoipa::path(
    post,
    path = "/sessions/{id}/summary",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Summary generated", body = SummaryResponse),
        (status = 409, description = "No document loaded", body = ErrorBody),
        (status = 502, description = "Model call failed", body = ErrorBody)
    )
)]
pub async fn summarize_handler(
    State(state): State<Arc<AppState>>,
    Extension(assistant): Extension<Assistant>,
    Path(id): Path<Uuid>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let summary = assistant.summarize(&mut session).await?;
    Ok(Json(SummaryResponse { summary }))
}

/// Choose Ask-Anything, Challenge-Me, or leave the current mode.
#[utoipa::path(
    put,
    path = "/sessions/{id}/mode",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SelectModeRequest,
    responses(
        (status = 200, description = "Mode selected", body = SessionView),
        (status = 409, description = "No document loaded", body = ErrorBody)
    )
)]
pub async fn select_mode_handler(
    State(state): State<Arc<AppState>>,
    Extension(assistant): Extension<Assistant>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectModeRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    assistant.select_mode(&mut session, req.mode.into())?;
    Ok(Json(SessionView::from(&*session)))
}

//=========================================================================================
// Ask-Anything Handlers
//=========================================================================================

#[utoipa::path(
    post,
    path = "/sessions/{id}/questions",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = AskRequest,
    responses(
        (status = 200, description = "Grounded answer", body = ChatTurnView),
        (status = 400, description = "Blank question", body = ErrorBody),
        (status = 409, description = "Not in ask mode", body = ErrorBody),
        (status = 502, description = "Model call failed", body = ErrorBody)
    )
)]
pub async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Extension(assistant): Extension<Assistant>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Result<Json<ChatTurnView>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let turn = assistant.ask(&mut session, &req.question).await?;
    Ok(Json(ChatTurnView::from(&turn)))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/history",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Chat history, most recent first", body = HistoryResponse),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(HistoryResponse {
        turns: session.history_newest_first().map(ChatTurnView::from).collect(),
    }))
}

//=========================================================================================
// Challenge-Me Handlers
//=========================================================================================

#[utoipa::path(
    post,
    path = "/sessions/{id}/quiz",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 201, description = "Three questions generated", body = QuizView),
        (status = 409, description = "Not in quiz mode or quiz already running", body = ErrorBody),
        (status = 502, description = "Model call failed or too few questions", body = ErrorBody)
    )
)]
pub async fn generate_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(assistant): Extension<Assistant>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<QuizView>), ApiError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    assistant.generate_quiz(&mut session).await?;
    Ok((StatusCode::CREATED, Json(QuizView::from(&*session))))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/quiz",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Quiz state and current question", body = QuizView),
        (status = 404, description = "Unknown session", body = ErrorBody)
    )
)]
pub async fn quiz_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizView>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(QuizView::from(&*session)))
}

/// Submit an answer to the current question; it is evaluated and the cursor advances.
#[utoipa::path(
    post,
    path = "/sessions/{id}/quiz/answer",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer evaluated", body = SubmitAnswerResponse),
        (status = 400, description = "Blank answer", body = ErrorBody),
        (status = 409, description = "Quiz not in the answering state", body = ErrorBody),
        (status = 502, description = "Model call failed", body = ErrorBody)
    )
)]
pub async fn submit_answer_handler(
    State(state): State<Arc<AppState>>,
    Extension(assistant): Extension<Assistant>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let evaluated = assistant.submit_answer(&mut session, &req.answer).await?;
    Ok(Json(SubmitAnswerResponse {
        evaluated: QuizQuestionView::from(&evaluated),
        quiz: QuizView::from(&*session),
    }))
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/quiz/previous",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Cursor moved back", body = QuizView),
        (status = 409, description = "Already at the first question", body = ErrorBody)
    )
)]
pub async fn previous_question_handler(
    State(state): State<Arc<AppState>>,
    Extension(assistant): Extension<Assistant>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizView>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    assistant.previous_question(&mut session)?;
    Ok(Json(QuizView::from(&*session)))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/quiz/results",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Aggregate score and per-question tiers", body = QuizResultsView),
        (status = 409, description = "Quiz not finished", body = ErrorBody)
    )
)]
pub async fn quiz_results_handler(
    State(state): State<Arc<AppState>>,
    Extension(assistant): Extension<Assistant>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizResultsView>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    let results = assistant.results(&session)?;
    Ok(Json(QuizResultsView::from(&results)))
}

/// Discard the finished quiz and return to the ready state.
#[utoipa::path(
    post,
    path = "/sessions/{id}/quiz/retry",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Quiz reset to ready", body = QuizView),
        (status = 409, description = "Quiz not finished", body = ErrorBody)
    )
)]
pub async fn retry_quiz_handler(
    State(state): State<Arc<AppState>>,
    Extension(assistant): Extension<Assistant>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizView>, ApiError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    assistant.retry_quiz(&mut session)?;
    Ok(Json(QuizView::from(&*session)))
}
