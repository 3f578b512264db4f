//! Shared helpers for the vidpress command line tools.

use serde::Serialize;
use uuid::Uuid;
use vidpress_core::models::VideoRecord;
use vidpress_core::IngestError;
use vidpress_infra::ErrorResponse;

/// Outcome of one ingest, as printed by `ingest_video`.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IngestReport {
    Published {
        video_id: Uuid,
        storage_key: Option<String>,
        url: Option<String>,
        orientation: Option<String>,
        version: i64,
    },
    Failed {
        video_id: Uuid,
        #[serde(flatten)]
        error: ErrorResponse,
    },
}

impl IngestReport {
    pub fn published(record: &VideoRecord) -> Self {
        IngestReport::Published {
            video_id: record.id,
            storage_key: record.storage_key.clone(),
            url: record.video_url.clone(),
            orientation: record.orientation.map(|o| o.to_string()),
            version: record.version,
        }
    }

    pub fn failed(video_id: Uuid, err: &IngestError) -> Self {
        IngestReport::Failed {
            video_id,
            error: ErrorResponse::from(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, IngestReport::Published { .. })
    }

    /// Human-readable rendering, one `key: value` per line.
    pub fn render_text(&self) -> String {
        match self {
            IngestReport::Published {
                video_id,
                storage_key,
                url,
                orientation,
                version,
            } => format!(
                "video:       {}\nkey:         {}\nurl:         {}\norientation: {}\nversion:     {}",
                video_id,
                storage_key.as_deref().unwrap_or("-"),
                url.as_deref().unwrap_or("-"),
                orientation.as_deref().unwrap_or("-"),
                version
            ),
            IngestReport::Failed { video_id, error } => format!(
                "video:  {}\nfailed: {} ({})\nerror:  {}\ndetail: {}",
                video_id,
                error.kind,
                error.code,
                error.error,
                truncate_string(error.detail.as_deref().unwrap_or("-"), 400)
            ),
        }
    }
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
