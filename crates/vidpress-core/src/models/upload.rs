use bytes::Bytes;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::pin::Pin;
use tokio::io::AsyncRead;

/// Raw upload handed over by the HTTP layer.
///
/// The body is consumed exactly once when the pipeline stages it to disk; the declared
/// size and media type are what validation looks at before any byte is read.
pub struct UploadAsset {
    pub reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    pub declared_size: u64,
    pub content_type: String,
}

impl UploadAsset {
    pub fn from_reader(
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        declared_size: u64,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            declared_size,
            content_type: content_type.into(),
        }
    }

    /// Build an asset from an in-memory body; the declared size is the body length.
    pub fn from_bytes(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        let data: Bytes = data.into();
        let declared_size = data.len() as u64;
        Self {
            reader: Box::pin(std::io::Cursor::new(data)),
            declared_size,
            content_type: content_type.into(),
        }
    }
}

impl Debug for UploadAsset {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("UploadAsset")
            .field("declared_size", &self.declared_size)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}
