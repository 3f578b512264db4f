//! Error types module
//!
//! All pipeline and ingest failures are unified under [`IngestError`]. Each variant maps onto
//! a [`FailureKind`] so callers get the `{kind, detail}` shape without matching on variants,
//! and self-describes its HTTP presentation through [`ErrorMetadata`].

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like storage hiccups
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "TRANSCODE_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried by the caller)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Coarse failure classification surfaced to the caller of `ingest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Transcode,
    ProbeParse,
    Publish,
    Timeout,
    NotFound,
    Forbidden,
    Conflict,
    Internal,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            FailureKind::Validation => "validation",
            FailureKind::Transcode => "transcode",
            FailureKind::ProbeParse => "probe_parse",
            FailureKind::Publish => "publish",
            FailureKind::Timeout => "timeout",
            FailureKind::NotFound => "not_found",
            FailureKind::Forbidden => "forbidden",
            FailureKind::Conflict => "conflict",
            FailureKind::Internal => "internal",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transcode failed (exit code {}): {stderr}", fmt_exit_code(.exit_code))]
    Transcode {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Probe failed: {0}")]
    ProbeParse(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("{tool} did not finish within {timeout_secs}s")]
    ToolTimeout { tool: String, timeout_secs: u64 },

    #[error("Failed to launch {tool}: {message}")]
    ToolLaunch { tool: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn fmt_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

/// Result type for pipeline and ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

impl IngestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            IngestError::Validation(_) => FailureKind::Validation,
            IngestError::Transcode { .. } => FailureKind::Transcode,
            IngestError::ProbeParse(_) => FailureKind::ProbeParse,
            IngestError::Publish(_) => FailureKind::Publish,
            IngestError::ToolTimeout { .. } => FailureKind::Timeout,
            IngestError::NotFound(_) => FailureKind::NotFound,
            IngestError::Forbidden(_) => FailureKind::Forbidden,
            IngestError::Conflict(_) => FailureKind::Conflict,
            IngestError::ToolLaunch { .. } | IngestError::Internal(_) => FailureKind::Internal,
        }
    }

    /// Diagnostic detail carried unchanged from the failing step (captured stderr for tools).
    pub fn detail(&self) -> String {
        match self {
            IngestError::Validation(e) => e.to_string(),
            IngestError::Transcode { stderr, .. } => stderr.clone(),
            IngestError::ProbeParse(detail)
            | IngestError::Publish(detail)
            | IngestError::NotFound(detail)
            | IngestError::Forbidden(detail)
            | IngestError::Conflict(detail)
            | IngestError::Internal(detail) => detail.clone(),
            IngestError::ToolTimeout { .. } | IngestError::ToolLaunch { .. } => self.to_string(),
        }
    }
}

impl From<io::Error> for IngestError {
    fn from(err: io::Error) -> Self {
        IngestError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::ProbeParse(format!("JSON parsing error: {}", err))
    }
}

impl ErrorMetadata for IngestError {
    fn http_status_code(&self) -> u16 {
        match self {
            IngestError::Validation(ValidationError::FileTooLarge { .. }) => 413,
            IngestError::Validation(ValidationError::InvalidContentType { .. }) => 415,
            IngestError::Validation(ValidationError::EmptyFile) => 400,
            IngestError::Transcode { .. } | IngestError::ProbeParse(_) => 422,
            IngestError::Publish(_) => 502,
            IngestError::ToolTimeout { .. } => 504,
            IngestError::NotFound(_) => 404,
            IngestError::Forbidden(_) => 403,
            IngestError::Conflict(_) => 409,
            IngestError::ToolLaunch { .. } | IngestError::Internal(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            IngestError::Validation(ValidationError::FileTooLarge { .. }) => "PAYLOAD_TOO_LARGE",
            IngestError::Validation(ValidationError::InvalidContentType { .. }) => {
                "UNSUPPORTED_MEDIA_TYPE"
            }
            IngestError::Validation(ValidationError::EmptyFile) => "EMPTY_FILE",
            IngestError::Transcode { .. } => "TRANSCODE_FAILED",
            IngestError::ProbeParse(_) => "PROBE_FAILED",
            IngestError::Publish(_) => "STORAGE_ERROR",
            IngestError::ToolTimeout { .. } => "TOOL_TIMEOUT",
            IngestError::NotFound(_) => "NOT_FOUND",
            IngestError::Forbidden(_) => "FORBIDDEN",
            IngestError::Conflict(_) => "CONFLICT",
            IngestError::ToolLaunch { .. } | IngestError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IngestError::Publish(_) | IngestError::ToolTimeout { .. } | IngestError::Conflict(_)
        )
    }

    fn client_message(&self) -> String {
        match self {
            IngestError::Validation(e) => e.to_string(),
            IngestError::Transcode { .. } => {
                "The video could not be prepared for playback".to_string()
            }
            IngestError::ProbeParse(_) => "The video stream could not be inspected".to_string(),
            IngestError::Publish(_) => "Storage is temporarily unavailable".to_string(),
            IngestError::ToolTimeout { .. } => "Video processing took too long".to_string(),
            IngestError::NotFound(msg) => format!("Not found: {}", msg),
            IngestError::Forbidden(_) => "You do not own this video".to_string(),
            IngestError::Conflict(_) => {
                "The video was modified concurrently, retry the upload".to_string()
            }
            IngestError::ToolLaunch { .. } | IngestError::Internal(_) => {
                "An internal error occurred".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self.kind() {
            FailureKind::Validation | FailureKind::NotFound | FailureKind::Forbidden => {
                LogLevel::Debug
            }
            FailureKind::Publish | FailureKind::Timeout | FailureKind::Conflict => LogLevel::Warn,
            FailureKind::Transcode | FailureKind::ProbeParse | FailureKind::Internal => {
                LogLevel::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_detail_is_stderr() {
        let err = IngestError::Transcode {
            exit_code: Some(1),
            stderr: "invalid data found".to_string(),
        };
        assert_eq!(err.kind(), FailureKind::Transcode);
        assert_eq!(err.detail(), "invalid data found");
        assert!(err.to_string().contains("exit code 1"));
        assert_eq!(err.http_status_code(), 422);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_validation_maps_to_client_errors() {
        let err: IngestError = ValidationError::FileTooLarge { size: 10, max: 5 }.into();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(err.http_status_code(), 413);
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_publish_is_recoverable() {
        let err = IngestError::Publish("connection reset".to_string());
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert_eq!(err.detail(), "connection reset");
    }

    #[test]
    fn test_timeout_kind() {
        let err = IngestError::ToolTimeout {
            tool: "ffmpeg".to_string(),
            timeout_secs: 3,
        };
        assert_eq!(err.kind(), FailureKind::Timeout);
        assert_eq!(err.http_status_code(), 504);
        assert_eq!(err.kind().to_string(), "timeout");
    }
}
