use std::sync::Arc;

use storage::repository::{MaintenanceRepository, QuestionRepository};

use crate::error::ContentError;

/// Per-topic question count for the management view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicOverview {
    pub topic: String,
    pub questions: u32,
}

/// Content management: topic overview and the destructive operations.
#[derive(Clone)]
pub struct ContentService {
    questions: Arc<dyn QuestionRepository>,
    maintenance: Arc<dyn MaintenanceRepository>,
}

impl ContentService {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        maintenance: Arc<dyn MaintenanceRepository>,
    ) -> Self {
        Self {
            questions,
            maintenance,
        }
    }

    /// Topics with their question counts, in first-seen storage order.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Storage` on repository failures.
    pub async fn topic_overview(&self) -> Result<Vec<TopicOverview>, ContentError> {
        let pool = self.questions.list_questions().await?;
        let mut overview: Vec<TopicOverview> = Vec::new();
        for question in pool {
            match overview.iter_mut().find(|t| t.topic == question.topic) {
                Some(entry) => entry.questions += 1,
                None => overview.push(TopicOverview {
                    topic: question.topic,
                    questions: 1,
                }),
            }
        }
        Ok(overview)
    }

    /// Delete a topic and every progress row referencing its questions.
    /// Returns the number of questions removed.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Storage` on repository failures.
    pub async fn delete_topic(&self, topic: &str) -> Result<u32, ContentError> {
        let removed = self.maintenance.delete_topic(topic).await?;
        Ok(removed)
    }

    /// Delete every question and every progress row. Irreversible, no backup.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Storage` on repository failures.
    pub async fn wipe_all(&self) -> Result<(), ContentError> {
        self.maintenance.wipe_all().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{InMemoryRepository, NewQuestionRecord};
    use study_core::model::{QuestionDraft, QuestionKind};

    async fn seed(repo: &InMemoryRepository, topics: &[&str]) {
        let batch: Vec<NewQuestionRecord> = topics
            .iter()
            .map(|topic| {
                let draft = QuestionDraft {
                    kind: QuestionKind::Flashcard,
                    prompt: "Q".into(),
                    answer: "A".into(),
                    options: None,
                };
                NewQuestionRecord::from_validated(&draft.validate(topic).unwrap())
            })
            .collect();
        repo.insert_questions(&batch).await.unwrap();
    }

    fn service(repo: &InMemoryRepository) -> ContentService {
        ContentService::new(Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn overview_groups_and_counts_in_first_seen_order() {
        let repo = InMemoryRepository::new();
        seed(&repo, &["Math", "History", "Math", "Math"]).await;

        let overview = service(&repo).topic_overview().await.unwrap();
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].topic, "Math");
        assert_eq!(overview[0].questions, 3);
        assert_eq!(overview[1].topic, "History");
        assert_eq!(overview[1].questions, 1);
    }

    #[tokio::test]
    async fn delete_topic_reports_removed_count() {
        let repo = InMemoryRepository::new();
        seed(&repo, &["Math", "History", "Math"]).await;

        let removed = service(&repo).delete_topic("Math").await.unwrap();
        assert_eq!(removed, 2);

        let overview = service(&repo).topic_overview().await.unwrap();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].topic, "History");
    }

    #[tokio::test]
    async fn wipe_leaves_nothing_behind() {
        let repo = InMemoryRepository::new();
        seed(&repo, &["Math"]).await;

        service(&repo).wipe_all().await.unwrap();
        assert!(service(&repo).topic_overview().await.unwrap().is_empty());
    }
}
