//! Publication of normalized artifacts to object storage.

use std::path::Path;
use std::sync::Arc;
use vidpress_core::{IngestError, IngestResult};
use vidpress_storage::{build_storage_key, Storage, StorageError};

/// Location of a published object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedObject {
    pub storage_key: String,
    pub url: String,
}

pub struct ObjectPublisher {
    storage: Arc<dyn Storage>,
}

impl ObjectPublisher {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Upload `path` under `{key_prefix}/{file name}` and return where it landed.
    pub async fn publish(
        &self,
        path: &Path,
        media_type: &str,
        key_prefix: &str,
    ) -> IngestResult<PublishedObject> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                IngestError::Internal(format!("Artifact has no usable file name: {}", path.display()))
            })?;

        let storage_key = build_storage_key(key_prefix, file_name).map_err(publish_error)?;

        let url = self
            .storage
            .upload_file(&storage_key, path, media_type)
            .await
            .map_err(publish_error)?;

        tracing::info!(
            storage_key = %storage_key,
            backend = %self.storage.backend_type(),
            "Artifact published"
        );

        Ok(PublishedObject { storage_key, url })
    }
}

fn publish_error(err: StorageError) -> IngestError {
    IngestError::Publish(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FailingStorage;
    use tempfile::tempdir;
    use vidpress_storage::LocalStorage;

    #[tokio::test]
    async fn test_publish_to_local_storage() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("store"), "http://cdn.test".to_string())
            .await
            .unwrap();
        let publisher = ObjectPublisher::new(Arc::new(storage));

        let artifact = dir.path().join("0a1b.mp4");
        tokio::fs::write(&artifact, b"faststart").await.unwrap();

        let published = publisher
            .publish(&artifact, "video/mp4", "landscape")
            .await
            .unwrap();

        assert_eq!(published.storage_key, "landscape/0a1b.mp4");
        assert_eq!(published.url, "http://cdn.test/landscape/0a1b.mp4");
        assert!(dir.path().join("store/landscape/0a1b.mp4").exists());
    }

    #[tokio::test]
    async fn test_storage_failure_is_publish_error() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(FailingStorage::new());
        let publisher = ObjectPublisher::new(storage.clone());

        let artifact = dir.path().join("0a1b.mp4");
        tokio::fs::write(&artifact, b"faststart").await.unwrap();

        let result = publisher.publish(&artifact, "video/mp4", "portrait").await;
        assert!(matches!(result, Err(IngestError::Publish(_))));
        assert_eq!(storage.attempts(), 1);
    }

    #[tokio::test]
    async fn test_empty_prefix_rejected() {
        let publisher = ObjectPublisher::new(Arc::new(FailingStorage::new()));
        let result = publisher
            .publish(Path::new("/scratch/a.mp4"), "video/mp4", "/")
            .await;
        assert!(matches!(result, Err(IngestError::Publish(_))));
    }
}
