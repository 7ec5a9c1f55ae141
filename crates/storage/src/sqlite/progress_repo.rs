use study_core::model::ProgressEntry;

use super::{
    SqliteRepository,
    mapping::{map_progress_row, question_id_to_i64},
};
use crate::repository::{NewProgressRecord, ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn append_entry(&self, entry: NewProgressRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO user_progress (username, question_id, is_correct, user_answer, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(&entry.username)
        .bind(question_id_to_i64(entry.question_id)?)
        .bind(entry.is_correct)
        .bind(&entry.user_answer)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn entries_for_user(&self, username: &str) -> Result<Vec<ProgressEntry>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT username, question_id, is_correct, user_answer, created_at
            FROM user_progress
            WHERE username = ?1
            ORDER BY id ASC
            ",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(map_progress_row(&row)?);
        }
        Ok(entries)
    }

    async fn delete_for_user(&self, username: &str) -> Result<u32, StorageError> {
        let res = sqlx::query("DELETE FROM user_progress WHERE username = ?1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(u32::try_from(res.rows_affected()).unwrap_or(u32::MAX))
    }
}
