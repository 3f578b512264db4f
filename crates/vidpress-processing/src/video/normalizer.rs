//! Container normalization
//!
//! Rewrites an upload into a streaming-friendly MP4 without re-encoding: every stream is
//! copied as-is and the `moov` atom is moved to the front of the file so playback can start
//! before the download completes.

use crate::command::{run_tool, validate_artifact_path, validate_tool_path};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vidpress_core::{IngestError, IngestResult};

const OUTPUT_EXTENSION: &str = "mp4";

pub struct StreamNormalizer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl StreamNormalizer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> IngestResult<Self> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path(&ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout,
        })
    }

    /// Path the normalized output is written to: the input with an `.mp4` extension.
    pub fn output_path_for(&self, input: &Path) -> IngestResult<PathBuf> {
        let output = input.with_extension(OUTPUT_EXTENSION);
        if output == input {
            return Err(IngestError::Internal(format!(
                "Normalized output would overwrite its input: {}",
                input.display()
            )));
        }
        Ok(output)
    }

    /// Normalize `input` next to itself and return the output path.
    pub async fn normalize(&self, input: &Path) -> IngestResult<PathBuf> {
        let output = self.output_path_for(input)?;
        self.normalize_into(input, &output).await?;
        Ok(output)
    }

    /// Normalize `input` into `output`, overwriting whatever is there.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart_remux"
    ))]
    pub async fn normalize_into(&self, input: &Path, output: &Path) -> IngestResult<()> {
        let start = std::time::Instant::now();
        let input = validate_artifact_path(input)?;
        let output = validate_artifact_path(output)?;

        let args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-y".into(),
            "-i".into(),
            input.into_os_string(),
            "-map_metadata".into(),
            "0".into(),
            "-c".into(),
            "copy".into(),
            "-movflags".into(),
            "+faststart".into(),
            "-f".into(),
            "mp4".into(),
            output.clone().into_os_string(),
        ];

        let result = run_tool(&self.ffmpeg_path, &args, self.timeout).await?;

        if !result.success() {
            let stderr = result.stderr_text();
            tracing::error!(
                exit_code = ?result.exit_code(),
                stderr = %stderr,
                duration_ms = start.elapsed().as_millis(),
                "Normalization failed"
            );
            return Err(IngestError::Transcode {
                exit_code: result.exit_code(),
                stderr,
            });
        }

        tracing::info!(
            output = %output.display(),
            duration_ms = start.elapsed().as_millis(),
            "Normalization completed"
        );

        Ok(())
    }
}
