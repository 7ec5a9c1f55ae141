use study_core::model::{Question, QuestionId};

use super::{
    SqliteRepository,
    mapping::{map_question_row, options_to_json, question_id_from_i64},
};
use crate::repository::{
    MaintenanceRepository, NewQuestionRecord, QuestionRepository, StorageError,
};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_questions(
        &self,
        batch: &[NewQuestionRecord],
    ) -> Result<Vec<QuestionId>, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut ids = Vec::with_capacity(batch.len());
        for record in batch {
            let res = sqlx::query(
                r"
                INSERT INTO questions (topic, type, question, answer, options)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(&record.topic)
            .bind(record.kind.as_str())
            .bind(&record.prompt)
            .bind(&record.answer)
            .bind(options_to_json(record.options.as_ref())?)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

            ids.push(question_id_from_i64(res.last_insert_rowid())?);
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(ids)
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, topic, type, question, answer, options
            FROM questions
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(map_question_row(&row)?);
        }
        Ok(questions)
    }
}

#[async_trait::async_trait]
impl MaintenanceRepository for SqliteRepository {
    async fn delete_topic(&self, topic: &str) -> Result<u32, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Progress rows first: question_id is a soft reference, so the
        // cascade has to happen here rather than via FK.
        sqlx::query(
            r"
            DELETE FROM user_progress
            WHERE question_id IN (SELECT id FROM questions WHERE topic = ?1)
            ",
        )
        .bind(topic)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let res = sqlx::query("DELETE FROM questions WHERE topic = ?1")
            .bind(topic)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let removed = u32::try_from(res.rows_affected()).unwrap_or(u32::MAX);
        log::info!("deleted topic {topic:?} ({removed} questions)");
        Ok(removed)
    }

    async fn wipe_all(&self) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM user_progress")
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("DELETE FROM questions")
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        log::warn!("wiped all questions and progress");
        Ok(())
    }
}
