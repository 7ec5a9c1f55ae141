use std::sync::Arc;

use study_core::Clock;
use study_core::model::{
    ProgressEntry, ProgressStats, Question, QuestionKind, SELF_REPORT_CORRECT,
    SELF_REPORT_INCORRECT,
};
use storage::repository::{NewProgressRecord, ProgressRepository};

use crate::error::AnswerError;
use crate::gateway::GradingGateway;

//
// ─── ANSWER OUTCOME ────────────────────────────────────────────────────────────
//

/// What the caller gets back after an answer is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub entry_id: i64,
    pub is_correct: bool,
    /// Grader feedback; only essays produce one.
    pub feedback: Option<String>,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Records answers into the append-only progress log.
///
/// Each `answer_*` call appends exactly one entry and never updates or
/// deletes history; the "needs review" state is derived elsewhere from the
/// whole log.
#[derive(Clone)]
pub struct ReviewService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
    grading: Arc<GradingGateway>,
}

impl ReviewService {
    #[must_use]
    pub fn new(
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
        grading: Arc<GradingGateway>,
    ) -> Self {
        Self {
            clock,
            progress,
            grading,
        }
    }

    /// Record a flashcard self-report.
    ///
    /// Correctness is whatever the user claims; the stored answer is a fixed
    /// sentinel rather than free text.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::KindMismatch` for non-flashcard questions and
    /// `AnswerError::Storage` if the append fails.
    pub async fn answer_flashcard(
        &self,
        username: &str,
        question: &Question,
        knew_it: bool,
    ) -> Result<AnswerOutcome, AnswerError> {
        expect_kind(question, QuestionKind::Flashcard)?;
        let sentinel = if knew_it {
            SELF_REPORT_CORRECT
        } else {
            SELF_REPORT_INCORRECT
        };
        self.append(username, question, knew_it, sentinel, None).await
    }

    /// Record a quiz answer.
    ///
    /// Correct iff the chosen option is literally the stored answer string —
    /// case-sensitive, no normalization.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::KindMismatch` for non-quiz questions and
    /// `AnswerError::Storage` if the append fails.
    pub async fn answer_quiz(
        &self,
        username: &str,
        question: &Question,
        selected: &str,
    ) -> Result<AnswerOutcome, AnswerError> {
        expect_kind(question, QuestionKind::Quiz)?;
        let is_correct = selected == question.answer;
        self.append(username, question, is_correct, selected, None)
            .await
    }

    /// Record an essay answer after grading it through the gateway.
    ///
    /// The gateway verdict is recorded verbatim together with the raw user
    /// text.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::EmptyAnswer` for blank input,
    /// `AnswerError::Grading` when the gateway fails, and
    /// `AnswerError::Storage` if the append fails.
    pub async fn answer_essay(
        &self,
        username: &str,
        question: &Question,
        user_answer: &str,
    ) -> Result<AnswerOutcome, AnswerError> {
        expect_kind(question, QuestionKind::Essay)?;
        if user_answer.trim().is_empty() {
            return Err(AnswerError::EmptyAnswer);
        }

        let verdict = self
            .grading
            .grade_essay(&question.prompt, &question.answer, user_answer)
            .await?;

        self.append(
            username,
            question,
            verdict.correct,
            user_answer,
            Some(verdict.feedback),
        )
        .await
    }

    /// Derived aggregate statistics for one user.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::Storage` if the log cannot be read.
    pub async fn stats(&self, username: &str) -> Result<ProgressStats, AnswerError> {
        let entries = self.progress.entries_for_user(username).await?;
        Ok(ProgressStats::from_entries(&entries))
    }

    /// The user's most recent entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::Storage` if the log cannot be read.
    pub async fn history(
        &self,
        username: &str,
        limit: usize,
    ) -> Result<Vec<ProgressEntry>, AnswerError> {
        let mut entries = self.progress.entries_for_user(username).await?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    /// Delete the user's whole history. The only way entries ever go away
    /// besides a topic cascade or a full wipe.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::Storage` on repository failures.
    pub async fn clear_history(&self, username: &str) -> Result<u32, AnswerError> {
        let removed = self.progress.delete_for_user(username).await?;
        Ok(removed)
    }

    async fn append(
        &self,
        username: &str,
        question: &Question,
        is_correct: bool,
        user_answer: &str,
        feedback: Option<String>,
    ) -> Result<AnswerOutcome, AnswerError> {
        let entry_id = self
            .progress
            .append_entry(NewProgressRecord {
                username: username.to_string(),
                question_id: question.id,
                is_correct,
                user_answer: user_answer.to_string(),
                created_at: self.clock.now(),
            })
            .await?;

        Ok(AnswerOutcome {
            entry_id,
            is_correct,
            feedback,
        })
    }
}

fn expect_kind(question: &Question, expected: QuestionKind) -> Result<(), AnswerError> {
    if question.kind == expected {
        Ok(())
    } else {
        Err(AnswerError::KindMismatch {
            expected,
            actual: question.kind,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use storage::repository::InMemoryRepository;
    use study_core::model::QuestionId;
    use study_core::time::fixed_clock;

    fn service(repo: &InMemoryRepository) -> ReviewService {
        ReviewService::new(
            fixed_clock(),
            Arc::new(repo.clone()),
            Arc::new(GradingGateway::new(None)),
        )
    }

    fn quiz(id: u64, answer: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            topic: "Geography".into(),
            kind: QuestionKind::Quiz,
            prompt: "Capital of France?".into(),
            answer: answer.into(),
            options: Some(vec![
                "Paris".into(),
                "paris".into(),
                "Rome".into(),
                "Berlin".into(),
            ]),
        }
    }

    fn flashcard(id: u64) -> Question {
        Question {
            id: QuestionId::new(id),
            topic: "Geography".into(),
            kind: QuestionKind::Flashcard,
            prompt: "Q".into(),
            answer: "A".into(),
            options: None,
        }
    }

    #[tokio::test]
    async fn quiz_match_is_exact_and_case_sensitive() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let question = quiz(1, "Paris");

        let outcome = service.answer_quiz("ada", &question, "paris").await.unwrap();
        assert!(!outcome.is_correct);

        let outcome = service.answer_quiz("ada", &question, "Paris").await.unwrap();
        assert!(outcome.is_correct);

        let entries = repo.entries_for_user("ada").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_answer, "paris");
        assert!(!entries[0].is_correct);
    }

    #[tokio::test]
    async fn flashcard_records_sentinel_answers() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let question = flashcard(1);

        service
            .answer_flashcard("ada", &question, true)
            .await
            .unwrap();
        service
            .answer_flashcard("ada", &question, false)
            .await
            .unwrap();

        let entries = repo.entries_for_user("ada").await.unwrap();
        assert_eq!(entries[0].user_answer, SELF_REPORT_CORRECT);
        assert_eq!(entries[1].user_answer, SELF_REPORT_INCORRECT);
        assert!(entries[0].is_correct);
        assert!(!entries[1].is_correct);
    }

    #[tokio::test]
    async fn kind_mismatch_is_rejected_before_writing() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let question = flashcard(1);

        let err = service.answer_quiz("ada", &question, "A").await.unwrap_err();
        assert!(matches!(err, AnswerError::KindMismatch { .. }));
        assert!(repo.entries_for_user("ada").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn essay_with_disabled_gateway_surfaces_disabled() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let question = Question {
            kind: QuestionKind::Essay,
            ..flashcard(1)
        };

        let err = service
            .answer_essay("ada", &question, "my essay")
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerError::Grading(GatewayError::Disabled)));
        assert!(repo.entries_for_user("ada").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_essay_is_rejected_locally() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let question = Question {
            kind: QuestionKind::Essay,
            ..flashcard(1)
        };

        let err = service.answer_essay("ada", &question, "  ").await.unwrap_err();
        assert!(matches!(err, AnswerError::EmptyAnswer));
    }

    #[tokio::test]
    async fn stats_and_history_are_derived_from_the_log() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let question = quiz(1, "Paris");

        for answer in ["Rome", "Paris", "Berlin"] {
            service.answer_quiz("ada", &question, answer).await.unwrap();
        }

        let stats = service.stats("ada").await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.correct, 1);

        let history = service.history("ada", 2).await.unwrap();
        assert_eq!(history.len(), 2);
        // Newest first.
        assert_eq!(history[0].user_answer, "Berlin");
        assert_eq!(history[1].user_answer, "Paris");

        let removed = service.clear_history("ada").await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(service.stats("ada").await.unwrap().total, 0);
    }
}
