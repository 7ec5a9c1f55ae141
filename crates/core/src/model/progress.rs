use chrono::{DateTime, Utc};

use crate::model::ids::QuestionId;

/// Sentinel `user_answer` recorded when a flashcard is self-reported known.
pub const SELF_REPORT_CORRECT: &str = "remembered";

/// Sentinel `user_answer` recorded when a flashcard is self-reported unknown.
pub const SELF_REPORT_INCORRECT: &str = "forgot";

//
// ─── PROGRESS ENTRY ────────────────────────────────────────────────────────────
//

/// One row of the append-only answer log.
///
/// Entries are never updated or deleted individually; several entries may
/// exist for the same (username, question) pair. The "needs review" status is
/// derived from the whole log, not read off the latest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    pub username: String,
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub user_answer: String,
    pub created_at: DateTime<Utc>,
}

impl ProgressEntry {
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        question_id: QuestionId,
        is_correct: bool,
        user_answer: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            username: username.into(),
            question_id,
            is_correct,
            user_answer: user_answer.into(),
            created_at,
        }
    }
}

//
// ─── DERIVED STATISTICS ────────────────────────────────────────────────────────
//

/// Aggregate answer counts for one user, derived from the log on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressStats {
    pub total: u32,
    pub correct: u32,
}

impl ProgressStats {
    #[must_use]
    pub fn from_entries(entries: &[ProgressEntry]) -> Self {
        let total = u32::try_from(entries.len()).unwrap_or(u32::MAX);
        let correct = u32::try_from(entries.iter().filter(|e| e.is_correct).count())
            .unwrap_or(u32::MAX);
        Self { total, correct }
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.total.saturating_sub(self.correct)
    }

    /// Percentage of correct answers. An empty log is 0, not a division error.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total) * 100.0
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn entry(question: u64, is_correct: bool) -> ProgressEntry {
        ProgressEntry::new(
            "ada",
            QuestionId::new(question),
            is_correct,
            if is_correct { "yes" } else { "no" },
            fixed_now(),
        )
    }

    #[test]
    fn stats_on_empty_log_are_zero() {
        let stats = ProgressStats::from_entries(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.correct, 0);
        assert_eq!(stats.accuracy(), 0.0);
    }

    #[test]
    fn accuracy_is_percentage() {
        let entries: Vec<_> = (0..10).map(|i| entry(i, i < 7)).collect();
        let stats = ProgressStats::from_entries(&entries);
        assert_eq!(stats.total, 10);
        assert_eq!(stats.correct, 7);
        assert_eq!(stats.incorrect(), 3);
        assert!((stats.accuracy() - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn entry_creation_keeps_fields() {
        let e = entry(5, true);
        assert_eq!(e.question_id, QuestionId::new(5));
        assert!(e.is_correct);
        assert_eq!(e.username, "ada");
    }
}
