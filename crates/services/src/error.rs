//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use study_core::model::QuestionKind;

/// Errors emitted by the AI gateways (extraction and grading).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("AI gateway is not configured")]
    Disabled,

    #[error("model {model} is out of quota")]
    RateLimited { model: String },

    #[error("gateway request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("gateway returned an empty response")]
    EmptyResponse,

    #[error("all candidate models failed")]
    Exhausted,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `FsDocumentStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentStoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors emitted by `GenerationService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error("a topic name is required to organize generated questions")]
    MissingTopic,

    #[error("no documents were provided")]
    NoDocuments,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReviewService` when recording an answer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("expected a {expected} question, got {actual}")]
    KindMismatch {
        expected: QuestionKind,
        actual: QuestionKind,
    },

    #[error("answer text is empty")]
    EmptyAnswer,

    #[error(transparent)]
    Grading(#[from] GatewayError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the study session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyError {
    #[error("no question under the cursor")]
    NoCurrentQuestion,

    #[error(transparent)]
    Answer(#[from] AnswerError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ContentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
