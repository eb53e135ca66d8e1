//! crates/document_assistant_core/src/prompts.rs
//!
//! Builds the fixed system instruction and the user content for each task the
//! assistant sends to the model. Truncation is by character count.

use std::fmt;

use crate::domain::ModelChoice;
use crate::ports::CompletionRequest;

/// Characters of document text embedded in a Summarize prompt.
pub const SUMMARY_CONTEXT_CHARS: usize = 4000;

/// Characters of document text embedded in GenerateQuiz and Evaluate prompts.
pub const QUIZ_CONTEXT_CHARS: usize = 3000;

const SUMMARIZE_INSTRUCTIONS: &str = "You are a document summarization expert. Create concise, informative summaries that capture the key points and main themes of documents in under 150 words.";

const ANSWER_INSTRUCTIONS: &str = r#"You are a helpful AI assistant that answers questions based STRICTLY on the provided document content.

CRITICAL RULES:
1. ONLY use information explicitly stated or directly inferable from the document
2. If the document doesn't contain information to answer the question, clearly state "The document does not contain information to answer this question"
3. ALWAYS provide justification by quoting or referencing specific parts of the document
4. Do NOT use external knowledge or make assumptions beyond the document content
5. Structure your response as: [Direct Answer] followed by [Justification with specific document references]"#;

const GENERATE_QUIZ_INSTRUCTIONS: &str = r#"You are an expert quiz generator. Create exactly 3 challenging, logic-based questions that test deep understanding of the document content.

REQUIREMENTS:
1. Generate EXACTLY 3 questions
2. Focus on comprehension, analysis, and critical thinking (not simple recall)
3. Questions must be answerable from the document content
4. Test understanding of relationships, implications, and reasoning
5. Format: One question per line, no numbering
6. Make questions thought-provoking and analytical"#;

const EVALUATE_INSTRUCTIONS: &str = r#"You are an expert evaluator. Assess answers based on accuracy, completeness, and understanding relative to the document content.

EVALUATION CRITERIA:
1. Accuracy: Factually correct based on the document
2. Completeness: Addresses all aspects of the question
3. Understanding: Demonstrates comprehension of concepts
4. Evidence: References or aligns with document content

SCORING (0-10):
- 9-10: Excellent - Accurate, complete, deep understanding
- 7-8: Good - Mostly accurate and complete
- 5-6: Fair - Partially correct, basic understanding
- 3-4: Poor - Some correct elements, significant gaps
- 0-2: Very Poor - Mostly incorrect or irrelevant

REQUIRED FORMAT:
SCORE: [number 0-10]
EVALUATION: [Detailed feedback with specific justifications from the document, explaining the score and how to improve]"#;

//=========================================================================================
// Task Kinds and Generation Parameters
//=========================================================================================

/// The four kinds of request the assistant sends to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Summarize,
    Answer,
    GenerateQuiz,
    Evaluate,
}

/// Output budget and sampling temperature for one task kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl TaskKind {
    pub fn params(&self) -> GenerationParams {
        let (max_output_tokens, temperature) = match self {
            TaskKind::Summarize => (200, 0.3),
            TaskKind::Answer => (500, 0.2),
            TaskKind::GenerateQuiz => (300, 0.4),
            TaskKind::Evaluate => (400, 0.3),
        };
        GenerationParams {
            max_output_tokens,
            temperature,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Summarize => "summarize",
            TaskKind::Answer => "answer",
            TaskKind::GenerateQuiz => "generate_quiz",
            TaskKind::Evaluate => "evaluate",
        }
    }

    /// Phrase used when reporting a failed call, e.g. "Error generating summary".
    pub(crate) fn failure_verb(&self) -> &'static str {
        match self {
            TaskKind::Summarize => "generating summary",
            TaskKind::Answer => "answering question",
            TaskKind::GenerateQuiz => "generating questions",
            TaskKind::Evaluate => "evaluating answer",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Prompt
//=========================================================================================

/// A fully rendered role/content pair for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub task: TaskKind,
    pub system_instruction: String,
    pub user_content: String,
}

impl Prompt {
    pub fn summarize(document_text: &str) -> Self {
        Self {
            task: TaskKind::Summarize,
            system_instruction: SUMMARIZE_INSTRUCTIONS.to_string(),
            user_content: format!(
                "Please provide a concise summary of the following document content in under 150 words. Focus on the main points, key themes, and important information:\n\n{}\n\nSummary:",
                truncate_chars(document_text, SUMMARY_CONTEXT_CHARS)
            ),
        }
    }

    /// The full document is embedded; answers must be grounded in all of it.
    pub fn answer(document_text: &str, question: &str) -> Self {
        Self {
            task: TaskKind::Answer,
            system_instruction: ANSWER_INSTRUCTIONS.to_string(),
            user_content: format!(
                "Document Content:\n{}\n\nQuestion: {}\n\nAnswer based solely on the document content above, with justification:",
                document_text, question
            ),
        }
    }

    pub fn generate_quiz(document_text: &str) -> Self {
        Self {
            task: TaskKind::GenerateQuiz,
            system_instruction: GENERATE_QUIZ_INSTRUCTIONS.to_string(),
            user_content: format!(
                "Based on this document content, generate exactly 3 challenging logic-based questions that test analytical thinking:\n\n{}\n\nQuestions:",
                truncate_chars(document_text, QUIZ_CONTEXT_CHARS)
            ),
        }
    }

    pub fn evaluate(document_text: &str, question: &str, user_answer: &str) -> Self {
        Self {
            task: TaskKind::Evaluate,
            system_instruction: EVALUATE_INSTRUCTIONS.to_string(),
            user_content: format!(
                "Document Content:\n{}\n\nQuestion: {}\n\nUser Answer: {}\n\nEvaluate this answer:",
                truncate_chars(document_text, QUIZ_CONTEXT_CHARS),
                question,
                user_answer
            ),
        }
    }

    /// Attaches the model choice and this task's fixed generation parameters.
    pub fn into_request(self, model: ModelChoice) -> CompletionRequest {
        let params = self.task.params();
        CompletionRequest {
            model,
            system_instruction: self.system_instruction,
            user_content: self.user_content,
            max_output_tokens: params.max_output_tokens,
            temperature: params.temperature,
        }
    }
}

/// Returns at most the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
