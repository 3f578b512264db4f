//! Storage backend whose uploads always fail.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use vidpress_storage::{Storage, StorageBackend, StorageError, StorageResult};

#[derive(Default)]
pub struct FailingStorage {
    pub attempts: AtomicUsize,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn upload_file(
        &self,
        _storage_key: &str,
        _path: &Path,
        _content_type: &str,
    ) -> StorageResult<String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::UploadFailed("quota exceeded".to_string()))
    }

    async fn delete(&self, _storage_key: &str) -> StorageResult<()> {
        Ok(())
    }

    async fn exists(&self, _storage_key: &str) -> StorageResult<bool> {
        Ok(false)
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("https://unreachable.invalid/{}", storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
