use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::content_service::ContentService;
use crate::documents::{DocumentStore, FsDocumentStore};
use crate::error::AppServicesError;
use crate::gateway::{AiGatewayConfig, ExtractionGateway, GradingGateway};
use crate::generation_service::GenerationService;
use crate::review_service::ReviewService;
use crate::study::StudyLoopService;

/// Default directory for uploaded document copies.
const DEFAULT_DOCS_DIR: &str = "documents";

/// Assembles the app-facing services over one storage backend.
///
/// AI credentials are optional: without them the generation and essay
/// grading features report themselves disabled while studying, statistics,
/// and content management keep working.
#[derive(Clone)]
pub struct AppServices {
    study_loop: Arc<StudyLoopService>,
    review: Arc<ReviewService>,
    generation: Arc<GenerationService>,
    content: Arc<ContentService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and env-configured gateways.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let docs_dir =
            std::env::var("STUDY_DOCS_DIR").unwrap_or_else(|_| DEFAULT_DOCS_DIR.into());
        let documents: Arc<dyn DocumentStore> =
            Arc::new(FsDocumentStore::new(docs_dir, clock));
        Ok(Self::assemble(
            storage,
            clock,
            AiGatewayConfig::from_env(),
            documents,
        ))
    }

    /// Wire the services over any storage backend and gateway configuration.
    #[must_use]
    pub fn assemble(
        storage: Storage,
        clock: Clock,
        gateway_config: Option<AiGatewayConfig>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        let extraction = Arc::new(ExtractionGateway::new(gateway_config.clone()));
        let grading = Arc::new(GradingGateway::new(gateway_config));

        let review = Arc::new(ReviewService::new(
            clock,
            Arc::clone(&storage.progress),
            grading,
        ));
        let study_loop = Arc::new(StudyLoopService::new(
            Arc::clone(&storage.questions),
            Arc::clone(&storage.progress),
            Arc::clone(&review),
        ));
        let generation = Arc::new(GenerationService::new(
            extraction,
            documents,
            Arc::clone(&storage.questions),
        ));
        let content = Arc::new(ContentService::new(
            Arc::clone(&storage.questions),
            Arc::clone(&storage.maintenance),
        ));

        Self {
            study_loop,
            review,
            generation,
            content,
        }
    }

    #[must_use]
    pub fn study_loop(&self) -> Arc<StudyLoopService> {
        Arc::clone(&self.study_loop)
    }

    #[must_use]
    pub fn review(&self) -> Arc<ReviewService> {
        Arc::clone(&self.review)
    }

    #[must_use]
    pub fn generation(&self) -> Arc<GenerationService> {
        Arc::clone(&self.generation)
    }

    #[must_use]
    pub fn content(&self) -> Arc<ContentService> {
        Arc::clone(&self.content)
    }
}
