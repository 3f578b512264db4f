//! Vidpress Infrastructure Library
//!
//! Shared infrastructure for vidpress binaries:
//! - Telemetry initialization (tracing subscriber, pretty or JSON output)
//! - Error responses built from `IngestError`

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, shutdown_telemetry};

pub use error::ErrorResponse;
