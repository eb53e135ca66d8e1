//! crates/document_assistant_core/src/assistant.rs
//!
//! The orchestrator. Wires user actions on a `Session` to the prompt builder,
//! the model gateway and the response parser.
//!
//! Every operation takes the session by mutable reference; the caller owns the
//! session and serialises access to it. A failed operation leaves the session
//! exactly as it was, so the user can simply re-trigger it.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info};

use crate::domain::{
    ChatTurn, Document, InteractionMode, QuizQuestion, QuizResults, QuizState, Session,
};
use crate::error::{AssistantError, AssistantResult};
use crate::parser::{Evaluation, HeuristicParser, ResponseParser};
use crate::ports::ModelGateway;
use crate::prompts::Prompt;

#[derive(Clone)]
pub struct Assistant {
    gateway: Arc<dyn ModelGateway>,
    parser: Arc<dyn ResponseParser>,
}

impl Assistant {
    /// Creates an assistant that parses replies with the default heuristics.
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self::with_parser(gateway, Arc::new(HeuristicParser))
    }

    pub fn with_parser(gateway: Arc<dyn ModelGateway>, parser: Arc<dyn ResponseParser>) -> Self {
        Self { gateway, parser }
    }

    /// Sends one prompt and returns the trimmed reply.
    async fn call(&self, session: &Session, prompt: Prompt) -> AssistantResult<String> {
        let task = prompt.task;
        let model = session.model;
        let started = Instant::now();

        let reply = self
            .gateway
            .complete(prompt.into_request(model))
            .await
            .map_err(|source| {
                error!(session_id = %session.id, %task, %model, "Model call failed: {}", source);
                AssistantError::ModelCallFailed { task, source }
            })?;

        info!(
            session_id = %session.id,
            %task,
            %model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model call completed"
        );
        Ok(reply.trim().to_string())
    }

    //=====================================================================================
    // Document Lifecycle
    //=====================================================================================

    /// Replaces whatever the session held with a freshly uploaded document.
    pub fn load_document(&self, session: &mut Session, document: Document) {
        session.reset();
        info!(session_id = %session.id, name = %document.name, "Document installed in session");
        session.document = Some(document);
    }

    /// Generates and caches the summary of the loaded document.
    pub async fn summarize(&self, session: &mut Session) -> AssistantResult<String> {
        let document = require_document(session)?;
        let prompt = Prompt::summarize(&document.raw_text);
        let summary = self.call(session, prompt).await?;
        session.summary = Some(summary.clone());
        Ok(summary)
    }

    /// Switches interaction mode. Entering the quiz always starts from a fresh `Ready` state.
    pub fn select_mode(&self, session: &mut Session, mode: InteractionMode) -> AssistantResult<()> {
        if mode != InteractionMode::None && session.document.is_none() {
            return Err(AssistantError::NoDocument);
        }
        if mode == InteractionMode::Quiz {
            session.clear_quiz();
        }
        info!(session_id = %session.id, from = %session.mode, to = %mode, "Mode selected");
        session.mode = mode;
        Ok(())
    }

    //=====================================================================================
    // Ask-Anything
    //=====================================================================================

    /// Answers a question from the document and appends the exchange to the history.
    pub async fn ask(&self, session: &mut Session, question: &str) -> AssistantResult<ChatTurn> {
        if question.trim().is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }
        require_mode(session, InteractionMode::Ask)?;
        let document = require_document(session)?;

        let prompt = Prompt::answer(&document.raw_text, question);
        let answer = self.call(session, prompt).await?;

        let turn = ChatTurn {
            question: question.to_string(),
            answer,
            timestamp: Utc::now(),
        };
        session.chat_history.push(turn.clone());
        Ok(turn)
    }

    //=====================================================================================
    // Challenge-Me
    //=====================================================================================

    /// `Ready -> Answering` once the model produces enough usable questions.
    pub async fn generate_quiz(&self, session: &mut Session) -> AssistantResult<Vec<QuizQuestion>> {
        require_mode(session, InteractionMode::Quiz)?;
        require_quiz_state(session, QuizState::Ready)?;
        let document = require_document(session)?;

        let prompt = Prompt::generate_quiz(&document.raw_text);
        let reply = self.call(session, prompt).await?;
        let texts = self.parser.quiz_questions(&reply).map_err(|e| {
            error!(session_id = %session.id, "Quiz generation rejected: {}", e);
            e
        })?;

        session.questions = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| QuizQuestion::new(i + 1, text))
            .collect();
        session.current_question_index = 0;
        session.quiz_state = QuizState::Answering;
        info!(session_id = %session.id, "Quiz generated");
        Ok(session.questions.clone())
    }

    /// Evaluates the answer to the question under the cursor, then advances.
    ///
    /// Blank answers are rejected before any model call.
    pub async fn submit_answer(
        &self,
        session: &mut Session,
        answer: &str,
    ) -> AssistantResult<QuizQuestion> {
        require_mode(session, InteractionMode::Quiz)?;
        require_quiz_state(session, QuizState::Answering)?;
        if answer.trim().is_empty() {
            return Err(AssistantError::EmptySubmission);
        }
        let document = require_document(session)?;
        let index = session.current_question_index;
        let question_text = session
            .questions
            .get(index)
            .map(|q| q.text.clone())
            .ok_or(AssistantError::InvalidQuizState(session.quiz_state))?;

        let prompt = Prompt::evaluate(&document.raw_text, &question_text, answer);
        let reply = self.call(session, prompt).await?;
        let Evaluation { score, rationale } = self.parser.evaluation(&reply);

        let question = &mut session.questions[index];
        question.user_answer = answer.to_string();
        question.evaluation_text = rationale;
        question.score = score;
        question.answered = true;
        let updated = question.clone();

        if index + 1 < session.questions.len() {
            session.current_question_index += 1;
        } else {
            session.quiz_state = QuizState::Results;
            info!(session_id = %session.id, "Quiz completed");
        }
        Ok(updated)
    }

    /// Moves the cursor back one question without re-evaluating anything.
    pub fn previous_question(&self, session: &mut Session) -> AssistantResult<QuizQuestion> {
        require_mode(session, InteractionMode::Quiz)?;
        require_quiz_state(session, QuizState::Answering)?;
        if session.current_question_index == 0 {
            return Err(AssistantError::NoPreviousQuestion);
        }
        session.current_question_index -= 1;
        Ok(session.questions[session.current_question_index].clone())
    }

    pub fn results(&self, session: &Session) -> AssistantResult<QuizResults> {
        require_mode(session, InteractionMode::Quiz)?;
        require_quiz_state(session, QuizState::Results)?;
        Ok(QuizResults::from_questions(&session.questions))
    }

    /// `Results -> Ready`, discarding the question set.
    pub fn retry_quiz(&self, session: &mut Session) -> AssistantResult<()> {
        require_mode(session, InteractionMode::Quiz)?;
        require_quiz_state(session, QuizState::Results)?;
        session.clear_quiz();
        Ok(())
    }
}

//=========================================================================================
// Guards
//=========================================================================================

/// Clones the loaded document so the session can be mutated while the prompt is in flight.
fn require_document(session: &Session) -> AssistantResult<Document> {
    session.document.clone().ok_or(AssistantError::NoDocument)
}

fn require_mode(session: &Session, expected: InteractionMode) -> AssistantResult<()> {
    if session.mode != expected {
        return Err(AssistantError::WrongMode {
            expected,
            actual: session.mode,
        });
    }
    Ok(())
}

fn require_quiz_state(session: &Session, expected: QuizState) -> AssistantResult<()> {
    if session.quiz_state != expected {
        return Err(AssistantError::InvalidQuizState(session.quiz_state));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelChoice;
    use crate::error::UnusableReason;
    use crate::ports::{CompletionRequest, PortError, PortResult};
    use crate::prompts::TaskKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A gateway that replays canned replies and records every request.
    #[derive(Default)]
    struct ScriptedGateway {
        replies: Mutex<VecDeque<PortResult<String>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedGateway {
        fn with(replies: Vec<PortResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request(&self, index: usize) -> CompletionRequest {
            self.requests.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl ModelGateway for ScriptedGateway {
        async fn complete(&self, request: CompletionRequest) -> PortResult<String> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PortError::Unexpected("no scripted reply".into())))
        }
    }

    const QUESTIONS: &str = "Why does the author link rainfall to crop yield?\n\
                             How would the argument change without irrigation data?\n\
                             What assumption underlies the final recommendation?";

    fn ok(text: &str) -> PortResult<String> {
        Ok(text.to_string())
    }

    fn session_with_document() -> Session {
        let mut session = Session::new(ModelChoice::Gpt35Turbo);
        session.document = Some(Document {
            name: "farming.txt".into(),
            raw_text: "Rainfall and irrigation together determine crop yield in the valley.".into(),
        });
        session
    }

    fn quiz_session(assistant: &Assistant) -> Session {
        let mut session = session_with_document();
        assistant.select_mode(&mut session, InteractionMode::Quiz).unwrap();
        session
    }

    #[tokio::test]
    async fn summarize_caches_trimmed_summary() {
        let gateway = ScriptedGateway::with(vec![ok("  The valley depends on rain.  ")]);
        let assistant = Assistant::new(gateway.clone());
        let mut session = session_with_document();

        let summary = assistant.summarize(&mut session).await.unwrap();

        assert_eq!(summary, "The valley depends on rain.");
        assert_eq!(session.summary.as_deref(), Some("The valley depends on rain."));
        let request = gateway.request(0);
        assert_eq!(request.max_output_tokens, 200);
        assert_eq!(request.model, ModelChoice::Gpt35Turbo);
    }

    #[tokio::test]
    async fn summarize_failure_keeps_document_and_reports_transport_text() {
        let gateway =
            ScriptedGateway::with(vec![Err(PortError::Unexpected("invalid api key".into()))]);
        let assistant = Assistant::new(gateway);
        let mut session = session_with_document();

        let err = assistant.summarize(&mut session).await.unwrap_err();

        assert!(matches!(
            err,
            AssistantError::ModelCallFailed {
                task: TaskKind::Summarize,
                ..
            }
        ));
        assert!(err.to_string().contains("invalid api key"));
        assert!(session.document.is_some());
        assert!(session.summary.is_none());
    }

    #[test]
    fn loading_a_document_clears_previous_state() {
        let assistant = Assistant::new(ScriptedGateway::with(vec![]));
        let mut session = session_with_document();
        session.mode = InteractionMode::Ask;
        session.summary = Some("old".into());
        session.chat_history.push(ChatTurn {
            question: "q".into(),
            answer: "a".into(),
            timestamp: Utc::now(),
        });

        let fresh = Document {
            name: "new.txt".into(),
            raw_text: "y".repeat(80),
        };
        assistant.load_document(&mut session, fresh.clone());

        assert_eq!(session.document, Some(fresh));
        assert!(session.summary.is_none());
        assert!(session.chat_history.is_empty());
        assert_eq!(session.mode, InteractionMode::None);
    }

    #[test]
    fn modes_require_a_document() {
        let assistant = Assistant::new(ScriptedGateway::with(vec![]));
        let mut session = Session::new(ModelChoice::Gpt4);
        assert!(matches!(
            assistant.select_mode(&mut session, InteractionMode::Ask),
            Err(AssistantError::NoDocument)
        ));
        assert!(assistant
            .select_mode(&mut session, InteractionMode::None)
            .is_ok());
    }

    #[tokio::test]
    async fn ask_appends_history_newest_first() {
        let gateway = ScriptedGateway::with(vec![ok("First answer."), ok("Second answer.")]);
        let assistant = Assistant::new(gateway.clone());
        let mut session = session_with_document();
        assistant.select_mode(&mut session, InteractionMode::Ask).unwrap();

        assistant.ask(&mut session, "What drives yield?").await.unwrap();
        assistant.ask(&mut session, "What about irrigation?").await.unwrap();

        let questions: Vec<&str> = session
            .history_newest_first()
            .map(|t| t.question.as_str())
            .collect();
        assert_eq!(questions, vec!["What about irrigation?", "What drives yield?"]);
        assert_eq!(gateway.request(0).max_output_tokens, 500);
        assert!(gateway.request(0).user_content.contains("Question: What drives yield?"));
    }

    #[tokio::test]
    async fn ask_outside_ask_mode_or_blank_makes_no_call() {
        let gateway = ScriptedGateway::with(vec![ok("unused")]);
        let assistant = Assistant::new(gateway.clone());
        let mut session = session_with_document();

        assert!(matches!(
            assistant.ask(&mut session, "Anything?").await,
            Err(AssistantError::WrongMode { .. })
        ));
        assistant.select_mode(&mut session, InteractionMode::Ask).unwrap();
        assert!(matches!(
            assistant.ask(&mut session, "   ").await,
            Err(AssistantError::EmptyQuestion)
        ));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn failed_answer_leaves_history_untouched() {
        let gateway = ScriptedGateway::with(vec![Err(PortError::Unexpected("timeout".into()))]);
        let assistant = Assistant::new(gateway);
        let mut session = session_with_document();
        assistant.select_mode(&mut session, InteractionMode::Ask).unwrap();

        assert!(assistant.ask(&mut session, "Why?").await.is_err());
        assert!(session.chat_history.is_empty());
    }

    #[tokio::test]
    async fn full_quiz_run_aggregates_scores() {
        let gateway = ScriptedGateway::with(vec![
            ok(QUESTIONS),
            ok("SCORE: 9\nEVALUATION: Excellent grasp."),
            ok("SCORE: 7\nEVALUATION: Mostly right."),
            ok("SCORE: 5\nEVALUATION: Partial."),
        ]);
        let assistant = Assistant::new(gateway.clone());
        let mut session = quiz_session(&assistant);

        let questions = assistant.generate_quiz(&mut session).await.unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].id, 1);
        assert_eq!(session.quiz_state, QuizState::Answering);

        for answer in ["Because rain feeds soil.", "Yields would drop.", "Stable climate."] {
            assistant.submit_answer(&mut session, answer).await.unwrap();
        }

        assert_eq!(session.quiz_state, QuizState::Results);
        let results = assistant.results(&session).unwrap();
        assert_eq!(results.total, 21);
        assert_eq!(results.max, 30);
        assert!((results.percentage - 70.0).abs() < 1e-9);
        assert_eq!(results.tier.as_str(), "good");
        assert_eq!(results.questions[1].evaluation_text, "Mostly right.");
        assert!(results.questions.iter().all(|q| q.answered));
        assert_eq!(gateway.request(1).max_output_tokens, 400);
    }

    #[tokio::test]
    async fn insufficient_questions_stay_ready() {
        let gateway = ScriptedGateway::with(vec![ok("Only one real question here?\nshort")]);
        let assistant = Assistant::new(gateway);
        let mut session = quiz_session(&assistant);

        let err = assistant.generate_quiz(&mut session).await.unwrap_err();

        assert!(matches!(err, AssistantError::QuizGenerationInsufficient { found: 1, .. }));
        assert_eq!(session.quiz_state, QuizState::Ready);
        assert!(session.questions.is_empty());
    }

    #[tokio::test]
    async fn empty_answer_is_rejected_without_a_call() {
        let gateway = ScriptedGateway::with(vec![ok(QUESTIONS)]);
        let assistant = Assistant::new(gateway.clone());
        let mut session = quiz_session(&assistant);
        assistant.generate_quiz(&mut session).await.unwrap();

        let err = assistant.submit_answer(&mut session, " \n\t").await.unwrap_err();

        assert!(matches!(err, AssistantError::EmptySubmission));
        assert_eq!(session.quiz_state, QuizState::Answering);
        assert_eq!(session.current_question_index, 0);
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn previous_revisits_without_reevaluating() {
        let gateway = ScriptedGateway::with(vec![
            ok(QUESTIONS),
            ok("SCORE: 3\nEVALUATION: Thin."),
            ok("SCORE: 8\nEVALUATION: Much better."),
        ]);
        let assistant = Assistant::new(gateway.clone());
        let mut session = quiz_session(&assistant);
        assistant.generate_quiz(&mut session).await.unwrap();

        assert!(matches!(
            assistant.previous_question(&mut session),
            Err(AssistantError::NoPreviousQuestion)
        ));
        assistant.submit_answer(&mut session, "Rain.").await.unwrap();
        assert_eq!(session.current_question_index, 1);

        let revisited = assistant.previous_question(&mut session).unwrap();
        assert_eq!(revisited.user_answer, "Rain.");
        assert_eq!(gateway.calls(), 2);

        let updated = assistant
            .submit_answer(&mut session, "Rain feeds the soil moisture.")
            .await
            .unwrap();
        assert_eq!(updated.id, 1);
        assert_eq!(updated.score, 8);
        assert_eq!(session.current_question_index, 1);
    }

    #[tokio::test]
    async fn failed_evaluation_changes_nothing() {
        let gateway = ScriptedGateway::with(vec![
            ok(QUESTIONS),
            Err(PortError::Unexpected("rate limited".into())),
        ]);
        let assistant = Assistant::new(gateway);
        let mut session = quiz_session(&assistant);
        assistant.generate_quiz(&mut session).await.unwrap();

        let err = assistant.submit_answer(&mut session, "An answer.").await.unwrap_err();

        assert!(err.to_string().starts_with("Error evaluating answer"));
        assert_eq!(session.current_question_index, 0);
        assert!(!session.questions[0].answered);
    }

    #[tokio::test]
    async fn retry_returns_to_ready_and_mode_exit_keeps_history() {
        let gateway = ScriptedGateway::with(vec![
            ok(QUESTIONS),
            ok("SCORE: 10"),
            ok("SCORE: 10"),
            ok("SCORE: 10"),
        ]);
        let assistant = Assistant::new(gateway);
        let mut session = quiz_session(&assistant);
        assert!(matches!(
            assistant.retry_quiz(&mut session),
            Err(AssistantError::InvalidQuizState(QuizState::Ready))
        ));

        assistant.generate_quiz(&mut session).await.unwrap();
        for _ in 0..3 {
            assistant.submit_answer(&mut session, "Answer.").await.unwrap();
        }
        assert_eq!(assistant.results(&session).unwrap().tier.as_str(), "excellent");

        assistant.retry_quiz(&mut session).unwrap();
        assert_eq!(session.quiz_state, QuizState::Ready);
        assert!(session.questions.is_empty());

        assistant.select_mode(&mut session, InteractionMode::None).unwrap();
        assert!(session.document.is_some());
    }

    #[test]
    fn unusable_reason_converts_into_assistant_error() {
        let err: AssistantError = UnusableReason::TooShort { chars: 10, min: 50 }.into();
        assert!(matches!(err, AssistantError::DocumentUnusable(_)));
    }
}
