use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use study_core::model::{ProgressEntry, Question, QuestionId, QuestionKind, ValidatedQuestion};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORD TYPES ──────────────────────────────────────────────────────────────
//

/// Insert shape for a question; the store assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestionRecord {
    pub topic: String,
    pub kind: QuestionKind,
    pub prompt: String,
    pub answer: String,
    pub options: Option<Vec<String>>,
}

impl NewQuestionRecord {
    #[must_use]
    pub fn from_validated(question: &ValidatedQuestion) -> Self {
        Self {
            topic: question.topic.clone(),
            kind: question.kind,
            prompt: question.prompt.clone(),
            answer: question.answer.clone(),
            options: question.options.clone(),
        }
    }
}

/// Insert shape for one progress log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgressRecord {
    pub username: String,
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub user_answer: String,
    pub created_at: DateTime<Utc>,
}

impl NewProgressRecord {
    #[must_use]
    pub fn into_entry(self) -> ProgressEntry {
        ProgressEntry::new(
            self.username,
            self.question_id,
            self.is_correct,
            self.user_answer,
            self.created_at,
        )
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for the question store.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist a generated batch, returning the assigned IDs in batch order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the batch cannot be stored.
    async fn insert_questions(
        &self,
        batch: &[NewQuestionRecord],
    ) -> Result<Vec<QuestionId>, StorageError>;

    /// Fetch every question in the store's natural insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;
}

/// Repository contract for the append-only progress log.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Append one entry; existing rows are never touched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_entry(&self, entry: NewProgressRecord) -> Result<i64, StorageError>;

    /// Fetch one user's entries in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn entries_for_user(&self, username: &str) -> Result<Vec<ProgressEntry>, StorageError>;

    /// Delete one user's whole history, returning the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn delete_for_user(&self, username: &str) -> Result<u32, StorageError>;
}

/// Destructive multi-table operations that must stay atomic.
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Delete every question under a topic plus all progress rows referencing
    /// them, in one transaction. Returns the number of questions removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn delete_topic(&self, topic: &str) -> Result<u32, StorageError>;

    /// Delete all rows from both tables. Irreversible.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failures.
    async fn wipe_all(&self) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    questions: Vec<Question>,
    progress: Vec<ProgressEntry>,
    next_question_id: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_questions(
        &self,
        batch: &[NewQuestionRecord],
    ) -> Result<Vec<QuestionId>, StorageError> {
        let mut state = self.lock()?;
        let mut ids = Vec::with_capacity(batch.len());
        for record in batch {
            state.next_question_id += 1;
            let id = QuestionId::new(state.next_question_id);
            state.questions.push(Question {
                id,
                topic: record.topic.clone(),
                kind: record.kind,
                prompt: record.prompt.clone(),
                answer: record.answer.clone(),
                options: record.options.clone(),
            });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        Ok(self.lock()?.questions.clone())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn append_entry(&self, entry: NewProgressRecord) -> Result<i64, StorageError> {
        let mut state = self.lock()?;
        state.progress.push(entry.into_entry());
        i64::try_from(state.progress.len())
            .map_err(|_| StorageError::Serialization("progress log overflow".into()))
    }

    async fn entries_for_user(&self, username: &str) -> Result<Vec<ProgressEntry>, StorageError> {
        Ok(self
            .lock()?
            .progress
            .iter()
            .filter(|e| e.username == username)
            .cloned()
            .collect())
    }

    async fn delete_for_user(&self, username: &str) -> Result<u32, StorageError> {
        let mut state = self.lock()?;
        let before = state.progress.len();
        state.progress.retain(|e| e.username != username);
        Ok(u32::try_from(before - state.progress.len()).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl MaintenanceRepository for InMemoryRepository {
    async fn delete_topic(&self, topic: &str) -> Result<u32, StorageError> {
        let mut state = self.lock()?;
        let doomed: HashSet<QuestionId> = state
            .questions
            .iter()
            .filter(|q| q.topic == topic)
            .map(|q| q.id)
            .collect();
        state.progress.retain(|e| !doomed.contains(&e.question_id));
        state.questions.retain(|q| q.topic != topic);
        Ok(u32::try_from(doomed.len()).unwrap_or(u32::MAX))
    }

    async fn wipe_all(&self) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.questions.clear();
        state.progress.clear();
        Ok(())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub maintenance: Arc<dyn MaintenanceRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            questions: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            maintenance: Arc::new(repo),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{QuestionDraft, QuestionKind};
    use study_core::time::fixed_now;

    fn record(topic: &str, kind: QuestionKind) -> NewQuestionRecord {
        let draft = QuestionDraft {
            kind,
            prompt: "Q".into(),
            answer: "A".into(),
            options: match kind {
                QuestionKind::Quiz => {
                    Some(vec!["A".into(), "B".into(), "C".into(), "D".into()])
                }
                _ => None,
            },
        };
        NewQuestionRecord::from_validated(&draft.validate(topic).unwrap())
    }

    fn progress(username: &str, question: QuestionId, is_correct: bool) -> NewProgressRecord {
        NewProgressRecord {
            username: username.into(),
            question_id: question,
            is_correct,
            user_answer: "x".into(),
            created_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_preserves_order() {
        let repo = InMemoryRepository::new();
        let ids = repo
            .insert_questions(&[
                record("Math", QuestionKind::Flashcard),
                record("Math", QuestionKind::Quiz),
            ])
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);

        let listed = repo.list_questions().await.unwrap();
        let listed_ids: Vec<QuestionId> = listed.iter().map(|q| q.id).collect();
        assert_eq!(listed_ids, ids);
    }

    #[tokio::test]
    async fn progress_is_scoped_per_user() {
        let repo = InMemoryRepository::new();
        let ids = repo
            .insert_questions(&[record("Math", QuestionKind::Flashcard)])
            .await
            .unwrap();

        repo.append_entry(progress("ada", ids[0], false)).await.unwrap();
        repo.append_entry(progress("bob", ids[0], true)).await.unwrap();

        let ada = repo.entries_for_user("ada").await.unwrap();
        assert_eq!(ada.len(), 1);
        assert!(!ada[0].is_correct);

        let removed = repo.delete_for_user("ada").await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo.entries_for_user("ada").await.unwrap().is_empty());
        assert_eq!(repo.entries_for_user("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn topic_delete_cascades_to_progress() {
        let repo = InMemoryRepository::new();
        let ids = repo
            .insert_questions(&[
                record("Math", QuestionKind::Flashcard),
                record("History", QuestionKind::Essay),
            ])
            .await
            .unwrap();
        repo.append_entry(progress("ada", ids[0], false)).await.unwrap();
        repo.append_entry(progress("ada", ids[1], true)).await.unwrap();

        let removed = repo.delete_topic("Math").await.unwrap();
        assert_eq!(removed, 1);

        let remaining = repo.list_questions().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].topic, "History");

        let entries = repo.entries_for_user("ada").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].question_id, ids[1]);
    }

    #[tokio::test]
    async fn wipe_clears_everything() {
        let repo = InMemoryRepository::new();
        let ids = repo
            .insert_questions(&[record("Math", QuestionKind::Flashcard)])
            .await
            .unwrap();
        repo.append_entry(progress("ada", ids[0], true)).await.unwrap();

        repo.wipe_all().await.unwrap();
        assert!(repo.list_questions().await.unwrap().is_empty());
        assert!(repo.entries_for_user("ada").await.unwrap().is_empty());
    }
}
