//! Vidpress Storage Library
//!
//! This crate provides the object storage abstraction the ingestion pipeline publishes to,
//! with implementations for S3 (and S3-compatible providers) and the local filesystem.
//!
//! # Storage key format
//!
//! Published keys are namespaced by orientation: `{prefix}/{file_name}`, for example
//! `landscape/3f2a….mp4`. Keys must not contain `..` or a leading `/`. Key construction is
//! centralized in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::build_storage_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use vidpress_core::StorageBackend;
