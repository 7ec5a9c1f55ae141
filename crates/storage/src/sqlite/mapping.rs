use sqlx::Row;

use study_core::model::{ProgressEntry, Question, QuestionId, QuestionKind};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn question_id_to_i64(id: QuestionId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("question_id overflow".into()))
}

/// Serializes the quiz options column. `None` maps to SQL NULL so non-quiz
/// rows stay option-free.
pub(crate) fn options_to_json(
    options: Option<&Vec<String>>,
) -> Result<Option<String>, StorageError> {
    options
        .map(|opts| serde_json::to_string(opts).map_err(ser))
        .transpose()
}

pub(crate) fn options_from_json(raw: Option<String>) -> Result<Option<Vec<String>>, StorageError> {
    raw.map(|json| serde_json::from_str(&json).map_err(ser))
        .transpose()
}

pub(crate) fn map_question_row(row: &sqlx::sqlite::SqliteRow) -> Result<Question, StorageError> {
    let kind_str: String = row.try_get("type").map_err(ser)?;
    let kind = QuestionKind::parse(&kind_str).map_err(ser)?;

    Ok(Question {
        id: question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        topic: row.try_get("topic").map_err(ser)?,
        kind,
        prompt: row.try_get("question").map_err(ser)?,
        answer: row.try_get("answer").map_err(ser)?,
        options: options_from_json(row.try_get::<Option<String>, _>("options").map_err(ser)?)?,
    })
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ProgressEntry, StorageError> {
    Ok(ProgressEntry {
        username: row.try_get("username").map_err(ser)?,
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        is_correct: row.try_get("is_correct").map_err(ser)?,
        user_answer: row.try_get("user_answer").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
