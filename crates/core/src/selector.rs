//! Review selection: which questions make up the current study set.
//!
//! This is a pure function over the question pool, the active filters, and
//! one user's answer log. It never fails; an empty result is a valid result.

use std::collections::HashSet;

use crate::model::{ProgressEntry, Question, QuestionId, QuestionKind};

//
// ─── FILTERS ───────────────────────────────────────────────────────────────────
//

/// Topic restriction for a study set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TopicFilter {
    /// The "all topics" sentinel: no topic restriction.
    #[default]
    All,
    /// Exact string match against `Question::topic`.
    Named(String),
}

impl TopicFilter {
    #[must_use]
    pub fn named(topic: impl Into<String>) -> Self {
        Self::Named(topic.into())
    }

    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        match self {
            TopicFilter::All => true,
            TopicFilter::Named(name) => name == topic,
        }
    }
}

/// Full filter set for one study session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewFilter {
    pub topic: TopicFilter,
    pub kind: Option<QuestionKind>,
    pub only_failed: bool,
}

impl ReviewFilter {
    #[must_use]
    pub fn new(topic: TopicFilter, kind: Option<QuestionKind>, only_failed: bool) -> Self {
        Self {
            topic,
            kind,
            only_failed,
        }
    }
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// Select the ordered study set for one user.
///
/// Filters by topic and kind, then — in failed-only mode — restricts to the
/// questions the user still needs to review. A question needs review when it
/// has at least one incorrect answer and has *never* been answered correctly;
/// a single success retires it until it is failed again. When every failed
/// question was eventually answered correctly, the full failed set is used
/// instead, so review mode re-shows something rather than nothing.
///
/// The relative order of the input is preserved; no sorting, no shuffling.
#[must_use]
pub fn select(
    questions: &[Question],
    filter: &ReviewFilter,
    progress: &[ProgressEntry],
) -> Vec<Question> {
    let review_ids = filter.only_failed.then(|| review_set(progress));

    questions
        .iter()
        .filter(|q| filter.topic.matches(&q.topic))
        .filter(|q| filter.kind.is_none_or(|kind| q.kind == kind))
        .filter(|q| {
            review_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&q.id))
        })
        .cloned()
        .collect()
}

/// Ids of the questions currently counting as "needs review".
fn review_set(progress: &[ProgressEntry]) -> HashSet<QuestionId> {
    let mut failed = HashSet::new();
    let mut succeeded = HashSet::new();
    for entry in progress {
        if entry.is_correct {
            succeeded.insert(entry.question_id);
        } else {
            failed.insert(entry.question_id);
        }
    }

    let review: HashSet<QuestionId> = failed.difference(&succeeded).copied().collect();
    if review.is_empty() { failed } else { review }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
