//! Vidpress Video Processing Library
//!
//! This crate turns an uploaded video into a published, streaming-ready MP4: validation,
//! scratch staging, faststart normalization, orientation classification and publication,
//! plus the ingest service that records the result against a video.

pub mod command;
pub mod ingest;
pub mod pipeline;
pub mod repository;
pub mod temp;
pub mod validator;
pub mod video;

// Re-export commonly used types
pub use command::{run_tool, validate_tool_path, ToolError, ToolOutput};
pub use ingest::IngestService;
pub use pipeline::{PipelineConfig, PipelineStage, VideoPipeline};
pub use repository::{InMemoryVideoRepository, VideoRepository};
pub use temp::{
    ArtifactId, ArtifactScope, ArtifactState, ArtifactStats, CleanupWarning, TempArtifact,
    TempArtifactManager,
};
pub use validator::UploadValidator;
pub use video::publisher::PublishedObject;
pub use video::{ObjectPublisher, OrientationClassifier, StreamNormalizer};

// Test helpers (only available in test mode)
#[cfg(test)]
pub mod test_helpers;
