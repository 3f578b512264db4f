//! Video processing module
//!
//! The three stages a staged upload passes through: container normalization, orientation
//! probing and publication to object storage.

pub mod classifier;
pub mod normalizer;
pub mod publisher;

pub use classifier::OrientationClassifier;
pub use normalizer::StreamNormalizer;
pub use publisher::ObjectPublisher;
