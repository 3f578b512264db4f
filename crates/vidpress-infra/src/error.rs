//! Error response conversion
//!
//! [`ErrorResponse`] is the serialized `{kind, detail}` shape a failed ingest is reported in,
//! whether the caller is an HTTP handler or the CLI's JSON output.

use serde::Serialize;
use vidpress_core::{ErrorMetadata, FailureKind, IngestError};

/// Standard error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub recoverable: bool,
    #[serde(skip)]
    pub status: u16,
}

impl ErrorResponse {
    /// Build a response; `detail` carries internal context and is omitted in production.
    pub fn from_error(err: &IngestError, include_detail: bool) -> Self {
        Self {
            error: err.client_message(),
            code: err.error_code(),
            kind: err.kind(),
            detail: include_detail.then(|| err.detail()),
            recoverable: err.is_recoverable(),
            status: err.http_status_code(),
        }
    }
}

impl From<&IngestError> for ErrorResponse {
    fn from(err: &IngestError) -> Self {
        Self::from_error(err, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_response() {
        let err = IngestError::Transcode {
            exit_code: Some(1),
            stderr: "invalid data found".to_string(),
        };
        let response = ErrorResponse::from(&err);

        assert_eq!(response.status, 422);
        assert_eq!(response.code, "TRANSCODE_FAILED");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["kind"], "transcode");
        assert_eq!(json["detail"], "invalid data found");
        assert_eq!(json["recoverable"], false);
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_detail_hidden_when_requested() {
        let err = IngestError::Publish("bucket unreachable".to_string());
        let response = ErrorResponse::from_error(&err, false);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("detail").is_none());
        assert_eq!(json["kind"], "publish");
        assert_eq!(json["recoverable"], true);
    }
}
