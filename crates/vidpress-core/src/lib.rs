//! Vidpress Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and validation
//! types shared by every vidpress component.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, IngestConfig};
pub use error::{ErrorMetadata, FailureKind, IngestError, IngestResult, LogLevel};
pub use storage_types::StorageBackend;
pub use validation::ValidationError;
// Note: Storage, StorageError, StorageResult live in vidpress-storage
