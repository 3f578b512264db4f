//! Video ingestion pipeline
//!
//! Drives one upload through validate → stage → normalize → classify → publish. Every
//! scratch file a run creates belongs to that run's [`ArtifactScope`] and is released before
//! `run` returns, whether the run succeeded or failed at any stage.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use vidpress_core::models::{PublishedAsset, UploadAsset};
use vidpress_core::{
    Config, ErrorMetadata, IngestError, IngestResult, LogLevel, ValidationError,
};
use vidpress_storage::Storage;

use crate::temp::{ArtifactScope, ArtifactStats, TempArtifactManager};
use crate::validator::UploadValidator;
use crate::video::{ObjectPublisher, OrientationClassifier, StreamNormalizer};

/// Extension given to staged uploads before normalization.
const STAGED_EXTENSION: &str = "upload";

/// Configuration for a video pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub tool_timeout: Duration,
    pub max_video_size_bytes: u64,
    pub video_content_type: String,
    pub scratch_dir: PathBuf,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path().to_string(),
            ffprobe_path: config.ffprobe_path().to_string(),
            tool_timeout: config.tool_timeout(),
            max_video_size_bytes: config.max_video_size_bytes(),
            video_content_type: config.video_content_type().to_string(),
            scratch_dir: config.scratch_dir().to_path_buf(),
        }
    }
}

/// Stage a run is in; reported when a run fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Staged,
    Normalizing,
    Classifying,
    Publishing,
    Done,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Staged => "staged",
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::Classifying => "classifying",
            PipelineStage::Publishing => "publishing",
            PipelineStage::Done => "done",
        };
        write!(f, "{}", s)
    }
}

pub struct VideoPipeline {
    config: PipelineConfig,
    validator: UploadValidator,
    artifacts: TempArtifactManager,
    normalizer: StreamNormalizer,
    classifier: OrientationClassifier,
    publisher: ObjectPublisher,
}

impl VideoPipeline {
    pub fn new(config: PipelineConfig, storage: Arc<dyn Storage>) -> IngestResult<Self> {
        let validator =
            UploadValidator::new(config.max_video_size_bytes, config.video_content_type.clone());
        let artifacts = TempArtifactManager::new(&config.scratch_dir)?;
        let normalizer = StreamNormalizer::new(config.ffmpeg_path.clone(), config.tool_timeout)?;
        let classifier =
            OrientationClassifier::new(config.ffprobe_path.clone(), config.tool_timeout)?;
        let publisher = ObjectPublisher::new(storage);

        tracing::info!(
            scratch_dir = %artifacts.scratch_dir().display(),
            max_video_size_bytes = config.max_video_size_bytes,
            tool_timeout_secs = config.tool_timeout.as_secs(),
            "Video pipeline initialized"
        );

        Ok(Self {
            config,
            validator,
            artifacts,
            normalizer,
            classifier,
            publisher,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        self.publisher.storage()
    }

    pub fn scratch_dir(&self) -> &Path {
        self.artifacts.scratch_dir()
    }

    /// Artifact accounting across every run of this pipeline.
    pub fn artifact_stats(&self) -> ArtifactStats {
        self.artifacts.stats()
    }

    /// Run one upload through the pipeline.
    ///
    /// On failure the original error is returned unchanged; scratch files are released in
    /// every case and cleanup problems are only logged.
    #[tracing::instrument(skip(self, asset), fields(
        declared_size = asset.declared_size,
        content_type = %asset.content_type
    ))]
    pub async fn run(&self, asset: UploadAsset) -> IngestResult<PublishedAsset> {
        let start = Instant::now();
        let mut scope = self.artifacts.scope();
        let mut stage = PipelineStage::Validating;

        let result = self.execute(asset, &mut scope, &mut stage).await;

        let warnings = scope.release_all().await;
        if !warnings.is_empty() {
            tracing::warn!(
                count = warnings.len(),
                "Scratch cleanup finished with warnings"
            );
        }

        match &result {
            Ok(published) => tracing::info!(
                storage_key = %published.storage_key,
                orientation = %published.orientation,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Video pipeline completed"
            ),
            Err(e) => log_failure(e, stage, start),
        }

        result
    }

    async fn execute(
        &self,
        asset: UploadAsset,
        scope: &mut ArtifactScope,
        stage: &mut PipelineStage,
    ) -> IngestResult<PublishedAsset> {
        self.validator.validate(&asset)?;

        *stage = PipelineStage::Staged;
        let staged = scope
            .acquire(&format!("{}.{}", random_name(), STAGED_EXTENSION))
            .await?;

        // Read one byte past the ceiling so an understated declared size is still caught
        let limit = self.validator.max_file_size();
        let mut body = asset.reader.take(limit.saturating_add(1));
        let written = scope.get_mut(staged).write_from(&mut body).await?;
        if written > limit {
            return Err(ValidationError::FileTooLarge {
                size: written,
                max: limit,
            }
            .into());
        }
        if written == 0 {
            return Err(ValidationError::EmptyFile.into());
        }
        tracing::debug!(size_bytes = written, "Upload staged");

        *stage = PipelineStage::Normalizing;
        let input = scope.path(staged).to_path_buf();
        let output = self.normalizer.output_path_for(&input)?;
        // Owned before the tool runs so a partial output is released on failure
        let normalized = scope.adopt(output.clone());
        self.normalizer.normalize_into(&input, &output).await?;
        scope.get_mut(normalized).mark_in_use();
        let _ = scope.release(staged).await;

        *stage = PipelineStage::Classifying;
        let orientation = self.classifier.classify(&output).await?;

        *stage = PipelineStage::Publishing;
        let published = self
            .publisher
            .publish(&output, &self.config.video_content_type, orientation.as_str())
            .await?;

        *stage = PipelineStage::Done;
        Ok(PublishedAsset {
            storage_key: published.storage_key,
            url: published.url,
            orientation,
        })
    }
}

fn log_failure(err: &IngestError, stage: PipelineStage, start: Instant) {
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(
            error = %err,
            kind = %err.kind(),
            stage = %stage,
            duration_ms = duration_ms,
            "Video pipeline rejected upload"
        ),
        LogLevel::Warn => tracing::warn!(
            error = %err,
            kind = %err.kind(),
            stage = %stage,
            duration_ms = duration_ms,
            "Video pipeline failed"
        ),
        LogLevel::Error => tracing::error!(
            error = %err,
            kind = %err.kind(),
            stage = %stage,
            duration_ms = duration_ms,
            "Video pipeline failed"
        ),
    }
}

fn random_name() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
