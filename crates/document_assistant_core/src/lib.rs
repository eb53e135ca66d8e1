pub mod assistant;
pub mod domain;
pub mod error;
pub mod loader;
pub mod parser;
pub mod ports;
pub mod prompts;

pub use assistant::Assistant;
pub use domain::{
    ChatTurn, Document, InteractionMode, ModelChoice, OverallTier, QuizQuestion, QuizResults,
    QuizState, ScoreTier, Session,
};
pub use error::{AssistantError, AssistantResult, UnusableReason};
pub use loader::{DocumentKind, DocumentLoader, Upload};
pub use parser::{Evaluation, HeuristicParser, ResponseParser};
pub use ports::{CompletionRequest, ModelGateway, PdfTextExtractor, PortError, PortResult};
pub use prompts::{Prompt, TaskKind};
