//! Test helpers for pipeline unit tests
//!
//! Stand-ins for the external tools (small shell scripts) and a storage backend whose uploads
//! always fail, so every pipeline path can be exercised without ffmpeg or a bucket.

pub mod fake_tools;
pub mod mock_storage;

pub use fake_tools::*;
pub use mock_storage::*;
