//! Telemetry initialization
//!
//! Log output is plain `tracing`; `RUST_LOG` overrides the default filter.

mod init_basic;

pub use init_basic::{init_telemetry, shutdown_telemetry};
