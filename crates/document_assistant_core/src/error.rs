//! crates/document_assistant_core/src/error.rs
//!
//! The structured error taxonomy of the assistant. Every variant renders to the
//! message shown to the user; rendering happens only at the presentation boundary.

use crate::domain::{InteractionMode, QuizState};
use crate::ports::PortError;
use crate::prompts::TaskKind;

/// Why an uploaded file could not be turned into a usable `Document`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnusableReason {
    #[error("File appears to be empty")]
    Empty,
    #[error("File size must be less than 10MB (got {size} bytes)")]
    TooLarge { size: usize },
    #[error("Unsupported file type '{0}'; upload a PDF or TXT file")]
    UnsupportedType(String),
    #[error("Error extracting text from the document: {0}")]
    ExtractionFailed(String),
    #[error("Could not extract sufficient text from the document ({chars} characters, at least {min} required)")]
    TooShort { chars: usize, min: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("{0}")]
    DocumentUnusable(#[from] UnusableReason),

    #[error("Error {}: {source}", .task.failure_verb())]
    ModelCallFailed {
        task: TaskKind,
        #[source]
        source: PortError,
    },

    #[error("Could not generate sufficient questions ({found} of {required}). Please try again.")]
    QuizGenerationInsufficient { found: usize, required: usize },

    #[error("Please provide an answer before submitting")]
    EmptySubmission,

    #[error("Please enter a question")]
    EmptyQuestion,

    #[error("No document is loaded; upload a PDF or TXT document first")]
    NoDocument,

    #[error("This action requires the '{expected}' mode, but the session is in '{actual}' mode")]
    WrongMode {
        expected: InteractionMode,
        actual: InteractionMode,
    },

    #[error("This action is not available while the quiz is in the '{0}' state")]
    InvalidQuizState(QuizState),

    #[error("Already at the first question")]
    NoPreviousQuestion,
}

pub type AssistantResult<T> = Result<T, AssistantError>;
