//! services/api/src/web/protocol.rs
//!
//! Defines the JSON message protocol between the browser client and the API server.
//! Domain values are converted into these views only at the HTTP boundary.

use chrono::{DateTime, Utc};
use document_assistant_core::{
    ChatTurn, InteractionMode, ModelChoice, QuizQuestion, QuizResults, Session,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct CreateSessionRequest {
    /// Model identifier, e.g. `gpt-4o`. Defaults to the configured model.
    pub model: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SelectModelRequest {
    pub model: String,
}

/// The interaction modes a client may switch to.
#[derive(Deserialize, Debug, Clone, Copy, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModeParam {
    None,
    Ask,
    Quiz,
}

impl From<ModeParam> for InteractionMode {
    fn from(mode: ModeParam) -> Self {
        match mode {
            ModeParam::None => InteractionMode::None,
            ModeParam::Ask => InteractionMode::Ask,
            ModeParam::Quiz => InteractionMode::Quiz,
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SelectModeRequest {
    pub mode: ModeParam,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct SubmitAnswerRequest {
    pub answer: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CredentialRequest {
    pub api_key: String,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct CredentialStatus {
    pub configured: bool,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ModelView {
    pub id: String,
    pub description: String,
    pub default: bool,
}

impl ModelView {
    pub fn new(model: ModelChoice, default: ModelChoice) -> Self {
        Self {
            id: model.as_str().to_string(),
            description: model.description().to_string(),
            default: model == default,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct DocumentInfo {
    pub name: String,
    pub characters: usize,
}

/// A snapshot of everything the client needs to render a session.
#[derive(Serialize, Debug, ToSchema)]
pub struct SessionView {
    pub session_id: Uuid,
    pub model: String,
    pub document: Option<DocumentInfo>,
    pub summary: Option<String>,
    pub mode: String,
    pub quiz_state: String,
    pub current_question_index: usize,
    pub question_count: usize,
    pub chat_turns: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            model: session.model.as_str().to_string(),
            document: session.document.as_ref().map(|doc| DocumentInfo {
                name: doc.name.clone(),
                characters: doc.char_count(),
            }),
            summary: session.summary.clone(),
            mode: session.mode.as_str().to_string(),
            quiz_state: session.quiz_state.as_str().to_string(),
            current_question_index: session.current_question_index,
            question_count: session.questions.len(),
            chat_turns: session.chat_history.len(),
            created_at: session.created_at,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct UploadResponse {
    pub session: SessionView,
    /// Set when the document loaded but its summary could not be generated.
    pub summary_error: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ChatTurnView {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&ChatTurn> for ChatTurnView {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            question: turn.question.clone(),
            answer: turn.answer.clone(),
            timestamp: turn.timestamp,
        }
    }
}

/// Chat turns, most recent first.
#[derive(Serialize, Debug, ToSchema)]
pub struct HistoryResponse {
    pub turns: Vec<ChatTurnView>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct QuizQuestionView {
    pub id: usize,
    pub question: String,
    pub user_answer: String,
    pub evaluation: String,
    pub score: u8,
    pub answered: bool,
    pub tier: String,
}

impl From<&QuizQuestion> for QuizQuestionView {
    fn from(q: &QuizQuestion) -> Self {
        Self {
            id: q.id,
            question: q.text.clone(),
            user_answer: q.user_answer.clone(),
            evaluation: q.evaluation_text.clone(),
            score: q.score,
            answered: q.answered,
            tier: q.tier().as_str().to_string(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct QuizView {
    pub state: String,
    pub current_question_index: usize,
    /// Fraction of the quiz behind the cursor, in `0.0..1.0`.
    pub progress: f64,
    pub current_question: Option<QuizQuestionView>,
    pub questions: Vec<QuizQuestionView>,
}

impl From<&Session> for QuizView {
    fn from(session: &Session) -> Self {
        Self {
            state: session.quiz_state.as_str().to_string(),
            current_question_index: session.current_question_index,
            progress: session.quiz_progress(),
            current_question: session.current_question().map(QuizQuestionView::from),
            questions: session.questions.iter().map(QuizQuestionView::from).collect(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SubmitAnswerResponse {
    pub evaluated: QuizQuestionView,
    pub quiz: QuizView,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct QuizResultsView {
    pub total: u32,
    pub max: u32,
    pub percentage: f64,
    /// Percentage rendered with one decimal, e.g. `70.0%`.
    pub percentage_display: String,
    pub tier: String,
    pub questions: Vec<QuizQuestionView>,
}

impl From<&QuizResults> for QuizResultsView {
    fn from(results: &QuizResults) -> Self {
        Self {
            total: results.total,
            max: results.max,
            percentage: results.percentage,
            percentage_display: format!("{:.1}%", results.percentage),
            tier: results.tier.as_str().to_string(),
            questions: results.questions.iter().map(QuizQuestionView::from).collect(),
        }
    }
}
