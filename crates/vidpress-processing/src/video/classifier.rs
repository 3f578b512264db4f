//! Orientation classification from the first video stream's dimensions.

use crate::command::{run_tool, validate_artifact_path, validate_tool_path};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use vidpress_core::models::{Orientation, ProbeResult};
use vidpress_core::{IngestError, IngestResult};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

pub struct OrientationClassifier {
    ffprobe_path: String,
    timeout: Duration,
}

impl OrientationClassifier {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> IngestResult<Self> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout,
        })
    }

    /// Probe the dimensions of the first video stream in `path`.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe(&self, path: &Path) -> IngestResult<ProbeResult> {
        let start = std::time::Instant::now();
        let path = validate_artifact_path(path)?;

        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-select_streams".into(),
            "v:0".into(),
            "-show_entries".into(),
            "stream=width,height".into(),
            "-of".into(),
            "json".into(),
            path.into_os_string(),
        ];

        let output = run_tool(&self.ffprobe_path, &args, self.timeout).await?;

        if !output.success() {
            return Err(IngestError::ProbeParse(format!(
                "ffprobe exited with {:?}: {}",
                output.exit_code(),
                output.stderr_text()
            )));
        }

        let probe = parse_probe_output(&output.stdout)?;

        tracing::info!(
            width = probe.width,
            height = probe.height,
            duration_ms = start.elapsed().as_millis(),
            "Video probe completed"
        );

        Ok(probe)
    }

    /// Probe `path` and map its dimensions to an orientation.
    pub async fn classify(&self, path: &Path) -> IngestResult<Orientation> {
        let probe = self.probe(path).await?;
        let orientation = Orientation::from_probe(&probe);
        tracing::debug!(
            aspect_ratio = probe.aspect_ratio(),
            orientation = %orientation,
            "Orientation classified"
        );
        Ok(orientation)
    }
}

fn parse_probe_output(stdout: &[u8]) -> IngestResult<ProbeResult> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| IngestError::ProbeParse("No video stream found".to_string()))?;

    let width = stream
        .width
        .ok_or_else(|| IngestError::ProbeParse("Could not parse width".to_string()))?;
    let height = stream
        .height
        .ok_or_else(|| IngestError::ProbeParse("Could not parse height".to_string()))?;

    if width == 0 || height == 0 {
        return Err(IngestError::ProbeParse(format!(
            "Degenerate dimensions {}x{}",
            width, height
        )));
    }

    Ok(ProbeResult::new(width, height))
}
