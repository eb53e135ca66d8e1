//! crates/document_assistant_core/src/parser.rs
//!
//! Extracts structured results from the model's free-text replies.
//!
//! The model is asked for a format but nothing enforces it, so these rules are
//! line and substring heuristics behind the `ResponseParser` trait.

use tracing::warn;

use crate::domain::{MAX_SCORE_PER_QUESTION, QUIZ_LENGTH};
use crate::error::{AssistantError, AssistantResult};

/// Lines this short or shorter are never treated as questions.
pub const MIN_QUESTION_CHARS: usize = 10;

/// Score assigned when the reply carries no usable `SCORE:` line.
pub const DEFAULT_SCORE: u8 = 5;

const SCORE_MARKER: &str = "SCORE:";
const EVALUATION_MARKER: &str = "EVALUATION:";

/// A parsed answer evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub score: u8,
    pub rationale: String,
}

pub trait ResponseParser: Send + Sync {
    /// Returns exactly `QUIZ_LENGTH` questions or `QuizGenerationInsufficient`.
    fn quiz_questions(&self, reply: &str) -> AssistantResult<Vec<String>>;

    fn evaluation(&self, reply: &str) -> Evaluation;
}

/// The line/substring heuristics used against free-text replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicParser;

impl ResponseParser for HeuristicParser {
    fn quiz_questions(&self, reply: &str) -> AssistantResult<Vec<String>> {
        let questions: Vec<String> = reply
            .split('\n')
            .map(str::trim)
            .filter(|line| line.chars().count() > MIN_QUESTION_CHARS)
            .take(QUIZ_LENGTH)
            .map(str::to_string)
            .collect();

        if questions.len() < QUIZ_LENGTH {
            return Err(AssistantError::QuizGenerationInsufficient {
                found: questions.len(),
                required: QUIZ_LENGTH,
            });
        }
        Ok(questions)
    }

    fn evaluation(&self, reply: &str) -> Evaluation {
        let reply = reply.trim();
        let score = reply
            .split('\n')
            .filter(|line| line.to_uppercase().contains(SCORE_MARKER))
            .find_map(score_from_line)
            .unwrap_or_else(|| {
                warn!("No usable SCORE line in evaluation; defaulting to {}", DEFAULT_SCORE);
                DEFAULT_SCORE
            });

        let rationale = match find_ascii_case_insensitive(reply, EVALUATION_MARKER) {
            Some(start) => reply[start + EVALUATION_MARKER.len()..].trim().to_string(),
            None => {
                warn!("No EVALUATION marker in evaluation; using the whole reply");
                reply.to_string()
            }
        };

        Evaluation { score, rationale }
    }
}

/// Concatenates every digit on the line into one integer and clamps it to 0..=10.
/// A minus sign directly before the first digit makes the value negative.
fn score_from_line(line: &str) -> Option<u8> {
    let digits: String = line.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    let negative = line
        .find(|c: char| c.is_ascii_digit())
        .map(|i| line[..i].ends_with('-'))
        .unwrap_or(false);
    if negative {
        return Some(0);
    }

    // Overflow only happens for absurdly long digit runs, which clamp to the maximum anyway.
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    Some(value.min(u64::from(MAX_SCORE_PER_QUESTION)) as u8)
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`.
fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str) -> Evaluation {
        HeuristicParser.evaluation(text)
    }

    #[test]
    fn score_line_is_parsed() {
        assert_eq!(eval("SCORE: 7\nEVALUATION: Solid.").score, 7);
        assert_eq!(eval("Some preamble\nscore: 9\nmore").score, 9);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(eval("SCORE: 15").score, 10);
        assert_eq!(eval("SCORE: -3").score, 0);
    }

    #[test]
    fn missing_score_defaults_to_five() {
        assert_eq!(eval("EVALUATION: no score given").score, DEFAULT_SCORE);
        assert_eq!(eval("").score, DEFAULT_SCORE);
    }

    #[test]
    fn score_line_without_digits_is_skipped() {
        assert_eq!(eval("SCORE: n/a\nSCORE: 6").score, 6);
        assert_eq!(eval("SCORE: none").score, DEFAULT_SCORE);
    }

    #[test]
    fn all_digits_on_the_line_are_concatenated() {
        // "7/10" reads as 710 and clamps, the same as the free-text rule always has.
        assert_eq!(eval("SCORE: 7/10").score, 10);
    }

    #[test]
    fn rationale_follows_first_evaluation_marker() {
        let parsed = eval("SCORE: 8\nEVALUATION: Well reasoned.");
        assert_eq!(parsed.rationale, "Well reasoned.");

        let parsed = eval("SCORE: 8\nevaluation:  first  \nEVALUATION: second");
        assert_eq!(parsed.rationale, "first  \nEVALUATION: second");
    }

    #[test]
    fn rationale_falls_back_to_whole_text() {
        let parsed = eval("  SCORE: 4\nGood try.  ");
        assert_eq!(parsed.rationale, "SCORE: 4\nGood try.");
    }

    #[test]
    fn takes_first_three_qualifying_lines() {
        let reply = "How does the author justify claim one?\n\
                     Why is the second argument weaker?\n\
                     What would change if the premise failed?\n\
                     Which evidence supports the conclusion?\n\
                     How do sections two and three relate?";
        let questions = HeuristicParser.quiz_questions(reply).unwrap();
        assert_eq!(
            questions,
            vec![
                "How does the author justify claim one?",
                "Why is the second argument weaker?",
                "What would change if the premise failed?",
            ]
        );
    }

    #[test]
    fn short_and_blank_lines_are_discarded() {
        let reply = "Questions:\n\n  \nWhy does the process fail?\nshort one\nHow is the outcome measured?\n0123456789\nWhat limits the approach?";
        let questions = HeuristicParser.quiz_questions(reply).unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0], "Why does the process fail?");
        assert_eq!(questions[2], "What limits the approach?");
    }

    #[test]
    fn two_qualifying_lines_fail() {
        let reply = "Why does the process fail?\nHow is the outcome measured?\nok";
        match HeuristicParser.quiz_questions(reply) {
            Err(AssistantError::QuizGenerationInsufficient { found, required }) => {
                assert_eq!(found, 2);
                assert_eq!(required, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
