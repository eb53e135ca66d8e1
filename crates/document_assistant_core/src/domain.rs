//! crates/document_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of questions in every quiz.
pub const QUIZ_LENGTH: usize = 3;

/// Highest score a single answer can receive.
pub const MAX_SCORE_PER_QUESTION: u8 = 10;

//=========================================================================================
// Document, Chat and Quiz Values
//=========================================================================================

/// A text document extracted from an upload. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub raw_text: String,
}

impl Document {
    /// Length of the extracted text in characters.
    pub fn char_count(&self) -> usize {
        self.raw_text.chars().count()
    }
}

/// A single question-and-answer exchange in Ask-Anything mode.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// One question of a Challenge-Me quiz, updated in place as the user answers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    /// 1-based position in the quiz.
    pub id: usize,
    pub text: String,
    pub user_answer: String,
    pub evaluation_text: String,
    pub score: u8,
    pub answered: bool,
}

impl QuizQuestion {
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            user_answer: String::new(),
            evaluation_text: String::new(),
            score: 0,
            answered: false,
        }
    }

    pub fn tier(&self) -> ScoreTier {
        ScoreTier::for_score(self.score)
    }
}

//=========================================================================================
// Enumerations
//=========================================================================================

/// Which interaction the user has chosen after a document is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    None,
    Ask,
    Quiz,
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionMode::None => "none",
            InteractionMode::Ask => "ask",
            InteractionMode::Quiz => "quiz",
        }
    }
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The Challenge-Me state machine: `Ready -> Answering -> Results`, with retry back to `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizState {
    #[default]
    Ready,
    Answering,
    Results,
}

impl QuizState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizState::Ready => "ready",
            QuizState::Answering => "answering",
            QuizState::Results => "results",
        }
    }
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The hosted models a session may be configured to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelChoice {
    #[default]
    Gpt35Turbo,
    Gpt4,
    Gpt4o,
}

impl ModelChoice {
    pub fn all() -> [ModelChoice; 3] {
        [ModelChoice::Gpt35Turbo, ModelChoice::Gpt4, ModelChoice::Gpt4o]
    }

    /// The model identifier sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::Gpt35Turbo => "gpt-3.5-turbo",
            ModelChoice::Gpt4 => "gpt-4",
            ModelChoice::Gpt4o => "gpt-4o",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelChoice::Gpt35Turbo => "Fast and inexpensive; available on every access level.",
            ModelChoice::Gpt4 => "Higher capability; requires paid access.",
            ModelChoice::Gpt4o => "Highest capability; requires paid access.",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelChoice::all()
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown model '{}'", s))
    }
}

//=========================================================================================
// Tiers and Results
//=========================================================================================

/// Qualitative bucket for a single 0-10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreTier {
    pub fn for_score(score: u8) -> Self {
        if score >= 8 {
            ScoreTier::Excellent
        } else if score >= 6 {
            ScoreTier::Good
        } else if score >= 4 {
            ScoreTier::Fair
        } else {
            ScoreTier::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTier::Excellent => "excellent",
            ScoreTier::Good => "good",
            ScoreTier::Fair => "fair",
            ScoreTier::Poor => "poor",
        }
    }
}

/// Qualitative bucket for a whole quiz, derived from its percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallTier {
    Excellent,
    Good,
    NeedsImprovement,
}

impl OverallTier {
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            OverallTier::Excellent
        } else if percentage >= 60.0 {
            OverallTier::Good
        } else {
            OverallTier::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallTier::Excellent => "excellent",
            OverallTier::Good => "good",
            OverallTier::NeedsImprovement => "needs improvement",
        }
    }
}

/// The aggregate outcome of a finished quiz.
#[derive(Debug, Clone)]
pub struct QuizResults {
    pub total: u32,
    pub max: u32,
    pub percentage: f64,
    pub tier: OverallTier,
    pub questions: Vec<QuizQuestion>,
}

impl QuizResults {
    pub fn from_questions(questions: &[QuizQuestion]) -> Self {
        let total: u32 = questions.iter().map(|q| u32::from(q.score)).sum();
        let max = questions.len() as u32 * u32::from(MAX_SCORE_PER_QUESTION);
        let percentage = if max == 0 {
            0.0
        } else {
            f64::from(total) / f64::from(max) * 100.0
        };
        Self {
            total,
            max,
            percentage,
            tier: OverallTier::for_percentage(percentage),
            questions: questions.to_vec(),
        }
    }
}

//=========================================================================================
// Session (Aggregate Root)
//=========================================================================================

/// All state belonging to one interactive user session.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub model: ModelChoice,
    pub document: Option<Document>,
    pub summary: Option<String>,
    pub mode: InteractionMode,
    pub chat_history: Vec<ChatTurn>,
    pub questions: Vec<QuizQuestion>,
    pub quiz_state: QuizState,
    pub current_question_index: usize,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(model: ModelChoice) -> Self {
        Self {
            id: Uuid::new_v4(),
            model,
            document: None,
            summary: None,
            mode: InteractionMode::None,
            chat_history: Vec::new(),
            questions: Vec::new(),
            quiz_state: QuizState::Ready,
            current_question_index: 0,
            created_at: Utc::now(),
        }
    }

    /// Clears everything except the session identity and its model choice.
    pub fn reset(&mut self) {
        self.document = None;
        self.summary = None;
        self.mode = InteractionMode::None;
        self.chat_history.clear();
        self.clear_quiz();
    }

    pub(crate) fn clear_quiz(&mut self) {
        self.questions.clear();
        self.quiz_state = QuizState::Ready;
        self.current_question_index = 0;
    }

    /// The question under the cursor while answering.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.quiz_state {
            QuizState::Answering => self.questions.get(self.current_question_index),
            _ => None,
        }
    }

    /// Fraction of the quiz already passed by the cursor, for progress display.
    pub fn quiz_progress(&self) -> f64 {
        if self.questions.is_empty() {
            0.0
        } else {
            self.current_question_index as f64 / self.questions.len() as f64
        }
    }

    /// Chat turns ordered most-recent-first.
    pub fn history_newest_first(&self) -> impl Iterator<Item = &ChatTurn> {
        self.chat_history.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(scores: &[u8]) -> Vec<QuizQuestion> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| QuizQuestion {
                score: *s,
                answered: true,
                ..QuizQuestion::new(i + 1, format!("Question number {}?", i + 1))
            })
            .collect()
    }

    #[test]
    fn results_for_nine_seven_five_are_good() {
        let results = QuizResults::from_questions(&scored(&[9, 7, 5]));
        assert_eq!(results.total, 21);
        assert_eq!(results.max, 30);
        assert!((results.percentage - 70.0).abs() < 1e-9);
        assert_eq!(results.tier, OverallTier::Good);
    }

    #[test]
    fn overall_tier_cut_points() {
        assert_eq!(OverallTier::for_percentage(80.0), OverallTier::Excellent);
        assert_eq!(OverallTier::for_percentage(79.99), OverallTier::Good);
        assert_eq!(OverallTier::for_percentage(60.0), OverallTier::Good);
        assert_eq!(OverallTier::for_percentage(59.99), OverallTier::NeedsImprovement);
    }

    #[test]
    fn score_tier_cut_points() {
        assert_eq!(ScoreTier::for_score(10), ScoreTier::Excellent);
        assert_eq!(ScoreTier::for_score(8), ScoreTier::Excellent);
        assert_eq!(ScoreTier::for_score(7), ScoreTier::Good);
        assert_eq!(ScoreTier::for_score(6), ScoreTier::Good);
        assert_eq!(ScoreTier::for_score(5), ScoreTier::Fair);
        assert_eq!(ScoreTier::for_score(4), ScoreTier::Fair);
        assert_eq!(ScoreTier::for_score(3), ScoreTier::Poor);
        assert_eq!(ScoreTier::for_score(0), ScoreTier::Poor);
    }

    #[test]
    fn model_choice_parses_identifiers() {
        assert_eq!("gpt-4o".parse::<ModelChoice>(), Ok(ModelChoice::Gpt4o));
        assert_eq!(" GPT-4 ".parse::<ModelChoice>(), Ok(ModelChoice::Gpt4));
        assert!("claude".parse::<ModelChoice>().is_err());
    }

    #[test]
    fn reset_keeps_identity_and_model() {
        let mut session = Session::new(ModelChoice::Gpt4);
        let id = session.id;
        session.document = Some(Document {
            name: "a.txt".into(),
            raw_text: "x".repeat(60),
        });
        session.summary = Some("summary".into());
        session.mode = InteractionMode::Quiz;
        session.questions = scored(&[1, 2, 3]);
        session.quiz_state = QuizState::Results;
        session.current_question_index = 2;

        session.reset();

        assert_eq!(session.id, id);
        assert_eq!(session.model, ModelChoice::Gpt4);
        assert!(session.document.is_none());
        assert!(session.summary.is_none());
        assert_eq!(session.mode, InteractionMode::None);
        assert!(session.questions.is_empty());
        assert_eq!(session.quiz_state, QuizState::Ready);
        assert_eq!(session.current_question_index, 0);
    }
}
