//! Data models shared by the ingestion pipeline and its collaborators.

mod upload;
mod video;

pub use upload::*;
pub use video::*;
