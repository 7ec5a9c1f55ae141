#![forbid(unsafe_code)]

pub mod app_services;
pub mod content_service;
pub mod documents;
pub mod error;
pub mod gateway;
pub mod generation_service;
pub mod review_service;
pub mod study;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use content_service::{ContentService, TopicOverview};
pub use documents::{DocumentStore, FsDocumentStore, StoredDocument};
pub use error::{
    AnswerError, AppServicesError, ContentError, DocumentStoreError, GatewayError,
    GenerationError, StudyError,
};
pub use gateway::{
    AiGatewayConfig, ExtractionGateway, GenerationCounts, GradingGateway, SourceDocument,
};
pub use generation_service::{GenerationService, UploadedDocument};
pub use review_service::{AnswerOutcome, ReviewService};
pub use study::{StudyLoopService, StudyProgress, StudySession};
