use storage::repository::{ProgressRepository, QuestionRepository};
use study_core::selector::{self, ReviewFilter};

use super::service::StudySession;
use crate::error::StudyError;

/// Storage-backed study set construction.
pub(crate) struct StudyQueries;

impl StudyQueries {
    /// Load the question pool and the user's log, run the selector, and wrap
    /// the result in a session.
    ///
    /// The progress log is only fetched when the filter actually needs it.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Storage` when repository access fails.
    pub async fn load_session(
        username: &str,
        filter: ReviewFilter,
        resume: Option<&str>,
        questions: &dyn QuestionRepository,
        progress: &dyn ProgressRepository,
    ) -> Result<StudySession, StudyError> {
        let pool = questions.list_questions().await?;
        let entries = if filter.only_failed {
            progress.entries_for_user(username).await?
        } else {
            Vec::new()
        };

        let selected = selector::select(&pool, &filter, &entries);
        Ok(StudySession::new(username, filter, selected, resume))
    }

    /// Distinct topics in first-seen (storage) order.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Storage` when repository access fails.
    pub async fn available_topics(
        questions: &dyn QuestionRepository,
    ) -> Result<Vec<String>, StudyError> {
        let pool = questions.list_questions().await?;
        let mut topics: Vec<String> = Vec::new();
        for question in pool {
            if !topics.contains(&question.topic) {
                topics.push(question.topic);
            }
        }
        Ok(topics)
    }
}
