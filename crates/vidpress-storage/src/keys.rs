//! Shared key construction for storage backends.
//!
//! Key format: `{prefix}/{file_name}`, where the prefix is the orientation label.

use crate::traits::{StorageError, StorageResult};

/// Build a storage key from a prefix and a file name.
///
/// Slashes around the prefix are trimmed; the file name must be a single path segment.
pub fn build_storage_key(prefix: &str, file_name: &str) -> StorageResult<String> {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return Err(StorageError::InvalidKey("Key prefix is empty".to_string()));
    }
    if file_name.is_empty() || file_name.contains('/') || file_name.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Invalid file name for storage key: {}",
            file_name
        )));
    }

    let key = format!("{}/{}", prefix, file_name);
    validate_key(&key)?;
    Ok(key)
}

/// Reject keys that could escape the bucket root or the local storage directory.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Join a public base URL and a key.
pub fn join_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key)
}
