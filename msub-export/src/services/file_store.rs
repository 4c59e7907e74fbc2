//! File content retrieval
//!
//! Uploaded bytes live outside the database; a [`FileRecord`]'s storage key
//! locates them. The trait keeps package assembly independent of where the
//! bytes actually are.

use async_trait::async_trait;
use msub_common::models::FileRecord;
use std::path::PathBuf;

use crate::error::ExportError;

/// Access to stored file content
#[async_trait]
pub trait FileContentStore: Send + Sync {
    async fn get_content(&self, record: &FileRecord) -> Result<Vec<u8>, ExportError>;
}

/// Content store backed by a directory on the local filesystem
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileContentStore for LocalFileStore {
    async fn get_content(&self, record: &FileRecord) -> Result<Vec<u8>, ExportError> {
        let path = self.root.join(&record.storage_key);
        tokio::fs::read(&path).await.map_err(|e| {
            ExportError::FileContent(format!("{} ({}): {}", record.filename, path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msub_common::models::FileRole;
    use uuid::Uuid;

    #[tokio::test]
    async fn reads_bytes_at_storage_key() {
        let dir = tempfile::tempdir().unwrap();
        let record = FileRecord::new(
            Uuid::new_v4(),
            FileRole::ManuscriptSource,
            "paper.pdf",
            "application/pdf",
        );

        let path = dir.path().join(&record.storage_key);
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, b"%PDF-1.5 test").await.unwrap();

        let store = LocalFileStore::new(dir.path());
        let content = store.get_content(&record).await.unwrap();
        assert_eq!(content, b"%PDF-1.5 test");
    }

    #[tokio::test]
    async fn missing_content_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let record = FileRecord::new(
            Uuid::new_v4(),
            FileRole::SupportingFile,
            "figure1.png",
            "image/png",
        );

        let store = LocalFileStore::new(dir.path());
        let err = store.get_content(&record).await.unwrap_err();
        assert!(err.to_string().contains("figure1.png"));
    }
}
