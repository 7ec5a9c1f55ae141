use std::sync::Arc;

use storage::repository::{NewQuestionRecord, QuestionRepository};

use crate::documents::DocumentStore;
use crate::error::GenerationError;
use crate::gateway::{ExtractionGateway, GenerationCounts, SourceDocument};

/// One uploaded file: original name plus its extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub name: String,
    pub text: String,
}

impl UploadedDocument {
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Orchestrates document upload, question extraction, and persistence.
#[derive(Clone)]
pub struct GenerationService {
    extraction: Arc<ExtractionGateway>,
    documents: Arc<dyn DocumentStore>,
    questions: Arc<dyn QuestionRepository>,
}

impl GenerationService {
    #[must_use]
    pub fn new(
        extraction: Arc<ExtractionGateway>,
        documents: Arc<dyn DocumentStore>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            extraction,
            documents,
            questions,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.extraction.enabled()
    }

    /// Generate questions from uploaded documents and persist them under the
    /// given topic. Returns how many questions were created; zero means the
    /// gateway produced nothing usable.
    ///
    /// Document copies are stored best-effort: a failed upload is logged and
    /// generation continues.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::MissingTopic` for a blank topic,
    /// `GenerationError::NoDocuments` without input files, and propagates
    /// gateway or storage failures.
    pub async fn generate_from_documents(
        &self,
        username: &str,
        topic: &str,
        uploads: &[UploadedDocument],
    ) -> Result<usize, GenerationError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(GenerationError::MissingTopic);
        }
        if uploads.is_empty() {
            return Err(GenerationError::NoDocuments);
        }

        for upload in uploads {
            if let Err(err) = self
                .documents
                .put(username, &upload.name, upload.text.as_bytes())
                .await
            {
                log::warn!("could not store a copy of {}: {err}", upload.name);
            }
        }

        let sources: Vec<SourceDocument> = uploads
            .iter()
            .map(|u| SourceDocument::new(u.name.clone(), u.text.clone()))
            .collect();
        let drafts = self.extraction.extract_questions(&sources).await?;

        self.persist_drafts(topic, drafts).await
    }

    /// Generate additional questions for an existing topic with exact
    /// per-kind counts.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::MissingTopic` for a blank topic and
    /// propagates gateway or storage failures.
    pub async fn generate_more(
        &self,
        topic: &str,
        counts: GenerationCounts,
    ) -> Result<usize, GenerationError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(GenerationError::MissingTopic);
        }

        let existing: Vec<String> = self
            .questions
            .list_questions()
            .await?
            .into_iter()
            .filter(|q| q.topic == topic)
            .map(|q| q.prompt)
            .collect();

        let drafts = self
            .extraction
            .generate_for_topic(topic, counts, &existing)
            .await?;

        self.persist_drafts(topic, drafts).await
    }

    /// Validate and insert one batch of drafts.
    ///
    /// Drafts that fail validation (blank fields, wrong option count) are
    /// data-quality bugs from the gateway; they are skipped with a warning
    /// instead of poisoning the batch.
    async fn persist_drafts(
        &self,
        topic: &str,
        drafts: Vec<study_core::model::QuestionDraft>,
    ) -> Result<usize, GenerationError> {
        let mut batch = Vec::with_capacity(drafts.len());
        for draft in drafts {
            match draft.validate(topic) {
                Ok(validated) => batch.push(NewQuestionRecord::from_validated(&validated)),
                Err(err) => log::warn!("skipping generated question: {err}"),
            }
        }

        if batch.is_empty() {
            return Ok(0);
        }

        let ids = self.questions.insert_questions(&batch).await?;
        log::info!("created {} questions under topic {topic:?}", ids.len());
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentStore, StoredDocument};
    use crate::error::DocumentStoreError;
    use async_trait::async_trait;
    use storage::repository::InMemoryRepository;

    struct NullDocumentStore;

    #[async_trait]
    impl DocumentStore for NullDocumentStore {
        async fn put(
            &self,
            _username: &str,
            file_name: &str,
            _bytes: &[u8],
        ) -> Result<StoredDocument, DocumentStoreError> {
            Ok(StoredDocument {
                location: file_name.to_string(),
            })
        }
    }

    fn service(repo: &InMemoryRepository) -> GenerationService {
        GenerationService::new(
            Arc::new(ExtractionGateway::new(None)),
            Arc::new(NullDocumentStore),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn blank_topic_is_rejected_before_any_work() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let uploads = vec![UploadedDocument::new("notes.pdf", "text")];

        let err = service
            .generate_from_documents("ada", "   ", &uploads)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::MissingTopic));
    }

    #[tokio::test]
    async fn missing_documents_are_rejected() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);

        let err = service
            .generate_from_documents("ada", "Math", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::NoDocuments));
    }

    #[tokio::test]
    async fn disabled_gateway_surfaces_as_gateway_error() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let uploads = vec![UploadedDocument::new("notes.pdf", "text")];

        let err = service
            .generate_from_documents("ada", "Math", &uploads)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Gateway(_)));
        assert!(repo.list_questions().await.unwrap().is_empty());
    }
}
