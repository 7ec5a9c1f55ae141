//! Document storage adapter.
//!
//! Keeps a copy of every uploaded course document so generated questions can
//! be traced back to their source material. Upload failures are surfaced to
//! the caller as warnings and never abort a generation run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DocumentStoreError;

/// Location of a stored document copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub location: String,
}

/// Narrow contract over the external object store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store one document copy under the user's namespace and return its
    /// location.
    ///
    /// # Errors
    ///
    /// Returns `DocumentStoreError` if the copy cannot be written.
    async fn put(
        &self,
        username: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument, DocumentStoreError>;
}

/// Filesystem-backed document store.
pub struct FsDocumentStore {
    root: PathBuf,
    clock: study_core::Clock,
}

impl FsDocumentStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, clock: study_core::Clock) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    fn unique_name(file_name: &str, now: DateTime<Utc>) -> String {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("bin");
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}_{}.{extension}",
            now.format("%Y%m%d_%H%M%S"),
            &suffix[..8]
        )
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn put(
        &self,
        username: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument, DocumentStoreError> {
        let dir = self.root.join(username);
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(Self::unique_name(file_name, self.clock.now()));
        std::fs::write(&path, bytes)?;

        Ok(StoredDocument {
            location: path.display().to_string(),
        })
    }
}
