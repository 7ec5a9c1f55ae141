use std::fmt;

use study_core::SessionCursor;
use study_core::model::Question;
use study_core::selector::ReviewFilter;

use super::progress::StudyProgress;

//
// ─── STUDY SESSION ─────────────────────────────────────────────────────────────
//

/// Ephemeral study state for one user: the filtered question list plus the
/// cursor into it.
///
/// Sessions are never persisted; the cursor round-trips through a small
/// external parameter (see [`Self::cursor_param`]) so a position survives
/// reloads. The question list is recomputed whenever the filters change; the
/// cursor is re-clamped on every recomputation and only resets when it fell
/// out of range.
pub struct StudySession {
    username: String,
    filter: ReviewFilter,
    questions: Vec<Question>,
    cursor: SessionCursor,
}

impl StudySession {
    /// Build a session over an already-selected question list.
    ///
    /// `resume` is the externalized cursor value from a previous visit;
    /// missing or unusable values start at the first question.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        filter: ReviewFilter,
        questions: Vec<Question>,
        resume: Option<&str>,
    ) -> Self {
        let mut cursor = SessionCursor::from_param(resume);
        cursor.clamp(questions.len());
        Self {
            username: username.into(),
            filter,
            questions,
            cursor,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn filter(&self) -> &ReviewFilter {
        &self.filter
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The question under the cursor; `None` when the set is empty.
    #[must_use]
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.cursor.index())
    }

    /// Current position as shown to the user (1-based; 0 when empty).
    #[must_use]
    pub fn position(&self) -> usize {
        if self.questions.is_empty() {
            0
        } else {
            self.cursor.index() + 1
        }
    }

    #[must_use]
    pub fn progress(&self) -> StudyProgress {
        StudyProgress {
            position: self.position(),
            total: self.len(),
        }
    }

    /// Externalized cursor value, stored by the interface layer as `q=<n>`.
    #[must_use]
    pub fn cursor_param(&self) -> String {
        self.cursor.as_param()
    }

    pub fn next(&mut self) {
        self.cursor.advance(self.questions.len());
    }

    pub fn prev(&mut self) {
        self.cursor.retreat();
    }

    /// Jump to a 1-based position, clamped into the set.
    pub fn jump_to(&mut self, position: usize) {
        self.cursor.jump_to(position, self.questions.len());
    }

    /// Swap in a recomputed question list, keeping the position when it is
    /// still valid.
    pub fn replace_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.cursor.clamp(self.questions.len());
    }

    pub(crate) fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

impl fmt::Debug for StudySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudySession")
            .field("username", &self.username)
            .field("filter", &self.filter)
            .field("questions_len", &self.questions.len())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use study_core::model::{QuestionId, QuestionKind};

    fn question(id: u64) -> Question {
        Question {
            id: QuestionId::new(id),
            topic: "Math".into(),
            kind: QuestionKind::Flashcard,
            prompt: format!("Q{id}"),
            answer: format!("A{id}"),
            options: None,
        }
    }

    fn pool(n: u64) -> Vec<Question> {
        (1..=n).map(question).collect()
    }

    #[test]
    fn resume_restores_a_valid_position() {
        let session = StudySession::new("ada", ReviewFilter::default(), pool(5), Some("3"));
        assert_eq!(session.position(), 4);
        assert_eq!(session.current().unwrap().id, QuestionId::new(4));
    }

    #[test]
    fn out_of_range_resume_starts_over() {
        let session = StudySession::new("ada", ReviewFilter::default(), pool(3), Some("9"));
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn navigation_saturates_at_both_ends() {
        let mut session = StudySession::new("ada", ReviewFilter::default(), pool(2), None);
        session.prev();
        assert_eq!(session.position(), 1);
        session.next();
        session.next();
        assert_eq!(session.position(), 2);
    }

    #[test]
    fn jump_is_one_based() {
        let mut session = StudySession::new("ada", ReviewFilter::default(), pool(4), None);
        session.jump_to(3);
        assert_eq!(session.current().unwrap().id, QuestionId::new(3));
        session.jump_to(99);
        assert_eq!(session.position(), 4);
    }

    #[test]
    fn empty_session_has_no_current_question() {
        let session = StudySession::new("ada", ReviewFilter::default(), Vec::new(), Some("2"));
        assert!(session.is_empty());
        assert_eq!(session.position(), 0);
        assert!(session.current().is_none());
        assert_eq!(session.progress().fraction(), 0.0);
    }

    #[test]
    fn shrinking_the_list_resets_only_when_out_of_range() {
        let mut session = StudySession::new("ada", ReviewFilter::default(), pool(5), Some("2"));
        assert_eq!(session.position(), 3);

        // Still in range: the position survives the filter change.
        session.replace_questions(pool(4));
        assert_eq!(session.position(), 3);

        // Out of range now: back to the start.
        session.replace_questions(pool(2));
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn cursor_param_roundtrips_through_resume() {
        let mut session = StudySession::new("ada", ReviewFilter::default(), pool(5), None);
        session.next();
        session.next();
        let param = session.cursor_param();

        let restored =
            StudySession::new("ada", ReviewFilter::default(), pool(5), Some(&param));
        assert_eq!(restored.position(), 3);
    }
}
