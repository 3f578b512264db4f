//! Upload validation errors
//!
//! The rules themselves are applied by `vidpress_processing::UploadValidator`; the error type
//! lives here so `IngestError` can carry it without depending on the processing crate.

/// Validation failures for an inbound upload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid content type: {content_type} (accepted: {accepted})")]
    InvalidContentType {
        content_type: String,
        accepted: String,
    },

    #[error("Empty file")]
    EmptyFile,
}
