use std::sync::Arc;

use storage::repository::{ProgressRepository, QuestionRepository};
use study_core::selector::ReviewFilter;

use super::queries::StudyQueries;
use super::service::StudySession;
use crate::error::StudyError;
use crate::review_service::{AnswerOutcome, ReviewService};

/// Orchestrates session construction, navigation, and persisted answering.
#[derive(Clone)]
pub struct StudyLoopService {
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<dyn ProgressRepository>,
    review: Arc<ReviewService>,
}

impl StudyLoopService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        progress: Arc<dyn ProgressRepository>,
        review: Arc<ReviewService>,
    ) -> Self {
        Self {
            questions,
            progress,
            review,
        }
    }

    /// Build a session for the given filters, resuming at the externalized
    /// cursor value when one is provided.
    ///
    /// An empty session is a valid outcome; the caller decides how to phrase
    /// it (failed-only emptiness means "nothing left to review").
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Storage` on repository failures.
    pub async fn start_session(
        &self,
        username: &str,
        filter: ReviewFilter,
        resume: Option<&str>,
    ) -> Result<StudySession, StudyError> {
        StudyQueries::load_session(
            username,
            filter,
            resume,
            self.questions.as_ref(),
            self.progress.as_ref(),
        )
        .await
    }

    /// Re-run the selector for a session whose filters are unchanged,
    /// keeping the cursor when it is still in range.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Storage` on repository failures.
    pub async fn refresh_session(&self, session: &mut StudySession) -> Result<(), StudyError> {
        let refreshed = StudyQueries::load_session(
            session.username(),
            session.filter().clone(),
            None,
            self.questions.as_ref(),
            self.progress.as_ref(),
        )
        .await?;
        session.replace_questions(refreshed.into_questions());
        Ok(())
    }

    /// Distinct topics available for filtering, in storage order.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Storage` on repository failures.
    pub async fn available_topics(&self) -> Result<Vec<String>, StudyError> {
        StudyQueries::available_topics(self.questions.as_ref()).await
    }

    /// Record a flashcard self-report for the current question and advance.
    ///
    /// Flashcards auto-advance after answering; quiz and essay answers leave
    /// the cursor in place so the user can see the result.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::NoCurrentQuestion` on an empty session and
    /// propagates recording failures.
    pub async fn answer_flashcard(
        &self,
        session: &mut StudySession,
        knew_it: bool,
    ) -> Result<AnswerOutcome, StudyError> {
        let question = session.current().ok_or(StudyError::NoCurrentQuestion)?.clone();
        let outcome = self
            .review
            .answer_flashcard(session.username(), &question, knew_it)
            .await?;
        session.next();
        Ok(outcome)
    }

    /// Record a quiz answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::NoCurrentQuestion` on an empty session and
    /// propagates recording failures.
    pub async fn answer_quiz(
        &self,
        session: &mut StudySession,
        selected: &str,
    ) -> Result<AnswerOutcome, StudyError> {
        let question = session.current().ok_or(StudyError::NoCurrentQuestion)?.clone();
        let outcome = self
            .review
            .answer_quiz(session.username(), &question, selected)
            .await?;
        Ok(outcome)
    }

    /// Grade and record an essay answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::NoCurrentQuestion` on an empty session and
    /// propagates grading or recording failures.
    pub async fn answer_essay(
        &self,
        session: &mut StudySession,
        user_answer: &str,
    ) -> Result<AnswerOutcome, StudyError> {
        let question = session.current().ok_or(StudyError::NoCurrentQuestion)?.clone();
        let outcome = self
            .review
            .answer_essay(session.username(), &question, user_answer)
            .await?;
        Ok(outcome)
    }
}
