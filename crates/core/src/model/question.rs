use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Topic applied when a draft carries none.
pub const DEFAULT_TOPIC: &str = "General";

/// Number of options a quiz question must carry.
pub const QUIZ_OPTION_COUNT: usize = 4;

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// Closed set of question kinds. Immutable once a question is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Prompt/answer pair, correctness self-reported by the user.
    Flashcard,
    /// Multiple choice with exactly four options; graded by exact match.
    Quiz,
    /// Free-text development question; graded by the grading gateway.
    Essay,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Flashcard => "flashcard",
            QuestionKind::Quiz => "quiz",
            QuestionKind::Essay => "essay",
        }
    }

    /// Parses the storage/wire representation of a kind.
    ///
    /// # Errors
    ///
    /// Returns `QuestionValidationError::UnknownKind` for any other string.
    pub fn parse(s: &str) -> Result<Self, QuestionValidationError> {
        match s {
            "flashcard" => Ok(Self::Flashcard),
            "quiz" => Ok(Self::Quiz),
            "essay" => Ok(Self::Essay),
            other => Err(QuestionValidationError::UnknownKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question as produced by the extraction gateway.
///
/// The serde shape matches the gateway response items:
/// `{"type": ..., "question": ..., "answer": ..., "options": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(rename = "question")]
    pub prompt: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl QuestionDraft {
    /// Validate the draft under the given topic.
    ///
    /// A blank topic falls back to [`DEFAULT_TOPIC`]. Quiz drafts must carry
    /// exactly [`QUIZ_OPTION_COUNT`] options; any options on a non-quiz draft
    /// are rejected rather than silently dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuestionValidationError` if prompt or answer are blank, or if
    /// the options do not match the kind.
    pub fn validate(self, topic: &str) -> Result<ValidatedQuestion, QuestionValidationError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionValidationError::EmptyPrompt);
        }

        let answer = self.answer.trim().to_string();
        if answer.is_empty() {
            return Err(QuestionValidationError::EmptyAnswer);
        }

        let options = match (self.kind, self.options) {
            (QuestionKind::Quiz, Some(options)) => {
                if options.len() != QUIZ_OPTION_COUNT {
                    return Err(QuestionValidationError::BadOptionCount {
                        count: options.len(),
                    });
                }
                Some(options)
            }
            (QuestionKind::Quiz, None) => return Err(QuestionValidationError::MissingOptions),
            (_, None) => None,
            (kind, Some(_)) => return Err(QuestionValidationError::UnexpectedOptions { kind }),
        };

        let topic = topic.trim();
        let topic = if topic.is_empty() {
            DEFAULT_TOPIC.to_string()
        } else {
            topic.to_string()
        };

        Ok(ValidatedQuestion {
            topic,
            kind: self.kind,
            prompt,
            answer,
            options,
        })
    }
}

/// Question that has passed validation but has no store-assigned ID yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub topic: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub answer: String,
    pub options: Option<Vec<String>>,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            topic: self.topic,
            kind: self.kind,
            prompt: self.prompt,
            answer: self.answer,
            options: self.options,
        }
    }
}

/// Persisted question. `kind` and `options` never change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub topic: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub answer: String,
    pub options: Option<Vec<String>>,
}

//
// ─── QUESTION VALIDATION ERRORS ────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionValidationError {
    #[error("question prompt is empty")]
    EmptyPrompt,

    #[error("question answer is empty")]
    EmptyAnswer,

    #[error("quiz question has {count} options, expected {QUIZ_OPTION_COUNT}")]
    BadOptionCount { count: usize },

    #[error("quiz question has no options")]
    MissingOptions,

    #[error("{kind} question must not carry options")]
    UnexpectedOptions { kind: QuestionKind },

    #[error("unknown question kind: {0}")]
    UnknownKind(String),
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
