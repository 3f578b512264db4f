//! Ingest service
//!
//! Binds a pipeline run to an existing video record: checks ownership, runs the pipeline and
//! writes the published location back. If the record changed while the pipeline ran, the
//! freshly published object is deleted again so storage never holds an orphan.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;
use vidpress_core::models::{UploadAsset, VideoRecord};
use vidpress_core::{IngestError, IngestResult};

use crate::pipeline::VideoPipeline;
use crate::repository::VideoRepository;

pub struct IngestService {
    pipeline: Arc<VideoPipeline>,
    repository: Arc<dyn VideoRepository>,
}

impl IngestService {
    pub fn new(pipeline: Arc<VideoPipeline>, repository: Arc<dyn VideoRepository>) -> Self {
        Self {
            pipeline,
            repository,
        }
    }

    pub fn pipeline(&self) -> &Arc<VideoPipeline> {
        &self.pipeline
    }

    /// Ingest `asset` into the video `video_id` owned by `owner_id`.
    #[tracing::instrument(skip(self, asset), fields(video_id = %video_id, owner_id = %owner_id))]
    pub async fn ingest(
        &self,
        video_id: Uuid,
        owner_id: Uuid,
        asset: UploadAsset,
    ) -> IngestResult<VideoRecord> {
        let start = Instant::now();

        let mut record = self
            .repository
            .get(video_id)
            .await?
            .ok_or_else(|| IngestError::NotFound(format!("video {}", video_id)))?;

        if record.owner_id != owner_id {
            return Err(IngestError::Forbidden(format!(
                "video {} is not owned by {}",
                video_id, owner_id
            )));
        }

        let expected_version = record.version;
        let published = self.pipeline.run(asset).await?;
        record.apply_published(&published);

        match self.repository.update(record, expected_version).await {
            Ok(stored) => {
                tracing::info!(
                    storage_key = %published.storage_key,
                    orientation = %published.orientation,
                    version = stored.version,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Video ingested"
                );
                Ok(stored)
            }
            Err(e) => {
                if let Err(delete_err) = self
                    .pipeline
                    .storage()
                    .delete(&published.storage_key)
                    .await
                {
                    tracing::warn!(
                        error = %delete_err,
                        storage_key = %published.storage_key,
                        "Failed to delete object after record update failed"
                    );
                }
                tracing::warn!(
                    error = %e,
                    storage_key = %published.storage_key,
                    "Record update failed, published object withdrawn"
                );
                Err(e)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::pipeline::PipelineConfig;
    use crate::repository::InMemoryVideoRepository;
    use crate::test_helpers::{probe_json, write_script, REMUX_COPY};
    use async_trait::async_trait;
    use std::time::Duration;
    use tempfile::TempDir;
    use vidpress_core::models::Orientation;
    use vidpress_core::FailureKind;
    use vidpress_storage::{LocalStorage, Storage};

    /// Repository where another writer always lands between read and write.
    struct RacingRepository {
        inner: InMemoryVideoRepository,
    }

    #[async_trait]
    impl VideoRepository for RacingRepository {
        async fn get(&self, id: Uuid) -> IngestResult<Option<VideoRecord>> {
            self.inner.get(id).await
        }

        async fn update(
            &self,
            record: VideoRecord,
            expected_version: i64,
        ) -> IngestResult<VideoRecord> {
            let mut rival = record.clone();
            rival.title = "edited elsewhere".to_string();
            self.inner.update(rival, expected_version).await?;
            self.inner.update(record, expected_version).await
        }
    }

    async fn pipeline_in(dir: &TempDir) -> (Arc<VideoPipeline>, Arc<dyn Storage>) {
        let tools = dir.path().join("bin");
        std::fs::create_dir_all(&tools).unwrap();
        let ffmpeg = write_script(&tools, "ffmpeg", REMUX_COPY);
        let ffprobe = write_script(&tools, "ffprobe", &probe_json(720, 1280));

        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(dir.path().join("store"), "https://cdn.test".to_string())
                .await
                .unwrap(),
        );

        let config = PipelineConfig {
            ffmpeg_path: ffmpeg.to_string_lossy().into_owned(),
            ffprobe_path: ffprobe.to_string_lossy().into_owned(),
            tool_timeout: Duration::from_secs(10),
            max_video_size_bytes: 1024,
            video_content_type: "video/mp4".to_string(),
            scratch_dir: dir.path().join("scratch"),
        };

        let pipeline = Arc::new(VideoPipeline::new(config, storage.clone()).unwrap());
        (pipeline, storage)
    }

    fn upload() -> UploadAsset {
        UploadAsset::from_bytes(b"short portrait clip".to_vec(), "video/mp4")
    }

    #[tokio::test]
    async fn test_ingest_updates_record() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, storage) = pipeline_in(&dir).await;
        let repo = InMemoryVideoRepository::new();
        let owner = Uuid::new_v4();
        let record = VideoRecord::new(owner, "clip");
        repo.insert(record.clone()).await;

        let service = IngestService::new(pipeline.clone(), Arc::new(repo.clone()));
        let stored = service.ingest(record.id, owner, upload()).await.unwrap();

        assert_eq!(stored.version, 1);
        assert_eq!(stored.orientation, Some(Orientation::Portrait));
        let key = stored.storage_key.clone().unwrap();
        assert!(key.starts_with("portrait/"));
        assert_eq!(stored.video_url, Some(format!("https://cdn.test/{}", key)));
        assert!(storage.exists(&key).await.unwrap());
        assert_eq!(repo.get(record.id).await.unwrap().unwrap(), stored);
        assert_eq!(pipeline.artifact_stats().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_unknown_video_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline_in(&dir).await;
        let service = IngestService::new(pipeline.clone(), Arc::new(InMemoryVideoRepository::new()));

        let err = service
            .ingest(Uuid::new_v4(), Uuid::new_v4(), upload())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::NotFound);
        assert_eq!(pipeline.artifact_stats().acquired, 0);
    }

    #[tokio::test]
    async fn test_foreign_owner_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline_in(&dir).await;
        let repo = InMemoryVideoRepository::new();
        let record = VideoRecord::new(Uuid::new_v4(), "clip");
        repo.insert(record.clone()).await;

        let service = IngestService::new(pipeline.clone(), Arc::new(repo.clone()));
        let err = service
            .ingest(record.id, Uuid::new_v4(), upload())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Forbidden);
        assert_eq!(pipeline.artifact_stats().acquired, 0);
        assert_eq!(repo.get(record.id).await.unwrap().unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_conflict_withdraws_published_object() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline_in(&dir).await;
        let inner = InMemoryVideoRepository::new();
        let owner = Uuid::new_v4();
        let record = VideoRecord::new(owner, "clip");
        inner.insert(record.clone()).await;

        let repo = RacingRepository {
            inner: inner.clone(),
        };
        let service = IngestService::new(pipeline.clone(), Arc::new(repo));
        let err = service.ingest(record.id, owner, upload()).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Conflict);
        let stored = inner.get(record.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "edited elsewhere");

        let portrait_dir = dir.path().join("store").join("portrait");
        let leftovers = std::fs::read_dir(&portrait_dir)
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
        assert_eq!(pipeline.artifact_stats().outstanding(), 0);
    }

    #[tokio::test]
    async fn test_pipeline_failure_leaves_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, _) = pipeline_in(&dir).await;
        let repo = InMemoryVideoRepository::new();
        let owner = Uuid::new_v4();
        let record = VideoRecord::new(owner, "clip");
        repo.insert(record.clone()).await;

        let service = IngestService::new(pipeline, Arc::new(repo.clone()));
        let asset = UploadAsset::from_bytes(b"clip".to_vec(), "application/pdf");
        let err = service.ingest(record.id, owner, asset).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(repo.get(record.id).await.unwrap().unwrap(), record);
    }
}
