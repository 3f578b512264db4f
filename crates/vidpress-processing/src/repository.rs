//! Video record persistence
//!
//! The ingest service only needs to read a record and write it back under an optimistic
//! version check. [`InMemoryVideoRepository`] backs the CLI and the tests; a database-backed
//! implementation plugs in through the same trait.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use vidpress_core::models::VideoRecord;
use vidpress_core::{IngestError, IngestResult};

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> IngestResult<Option<VideoRecord>>;

    /// Persist `record` if the stored version still equals `expected_version`.
    ///
    /// Returns the stored record with its version bumped, or `Conflict` when another writer
    /// got there first.
    async fn update(&self, record: VideoRecord, expected_version: i64) -> IngestResult<VideoRecord>;
}

#[derive(Clone, Default)]
pub struct InMemoryVideoRepository {
    records: Arc<RwLock<HashMap<Uuid, VideoRecord>>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: VideoRecord) {
        self.records.write().await.insert(record.id, record);
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get(&self, id: Uuid) -> IngestResult<Option<VideoRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update(&self, mut record: VideoRecord, expected_version: i64) -> IngestResult<VideoRecord> {
        let mut records = self.records.write().await;

        let current = records
            .get(&record.id)
            .ok_or_else(|| IngestError::NotFound(format!("video {}", record.id)))?;

        if current.version != expected_version {
            return Err(IngestError::Conflict(format!(
                "video {} is at version {}, expected {}",
                record.id, current.version, expected_version
            )));
        }

        record.version = expected_version + 1;
        record.updated_at = Utc::now();
        records.insert(record.id, record.clone());

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let repo = InMemoryVideoRepository::new();
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let repo = InMemoryVideoRepository::new();
        let record = VideoRecord::new(Uuid::new_v4(), "clip");
        repo.insert(record.clone()).await;

        let mut changed = record.clone();
        changed.title = "renamed".to_string();
        let stored = repo.update(changed, 0).await.unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(repo.get(record.id).await.unwrap().unwrap().title, "renamed");
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let repo = InMemoryVideoRepository::new();
        let record = VideoRecord::new(Uuid::new_v4(), "clip");
        repo.insert(record.clone()).await;

        repo.update(record.clone(), 0).await.unwrap();
        let result = repo.update(record.clone(), 0).await;

        assert!(matches!(result, Err(IngestError::Conflict(_))));
        assert_eq!(repo.get(record.id).await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = InMemoryVideoRepository::new();
        let result = repo.update(VideoRecord::new(Uuid::new_v4(), "clip"), 0).await;
        assert!(matches!(result, Err(IngestError::NotFound(_))));
    }
}
