use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// 16:9
pub const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
/// 9:16
pub const PORTRAIT_RATIO: f64 = 9.0 / 16.0;
/// Maximum distance from a canonical ratio that still counts as a match.
pub const RATIO_TOLERANCE: f64 = 0.1;

/// Dimensions of the first video stream, as reported by the probe tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub width: u32,
    pub height: u32,
}

impl ProbeResult {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height. Callers guarantee `height > 0`.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// Orientation label used as the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    /// Classify a probe result.
    ///
    /// A ratio within tolerance of 16:9 is landscape, then within tolerance of 9:16 is
    /// portrait. Anything else falls back to a plain width/height comparison, where a
    /// square frame (ratio exactly 1.0) resolves to portrait.
    pub fn from_probe(probe: &ProbeResult) -> Self {
        let ratio = probe.aspect_ratio();

        if (ratio - LANDSCAPE_RATIO).abs() < RATIO_TOLERANCE {
            Orientation::Landscape
        } else if (ratio - PORTRAIT_RATIO).abs() < RATIO_TOLERANCE {
            Orientation::Portrait
        } else if ratio > 1.0 {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedAsset {
    pub storage_key: String,
    pub url: String,
    pub orientation: Orientation,
}

/// Externally owned video record that a successful ingest writes back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub video_url: Option<String>,
    pub storage_key: Option<String>,
    pub orientation: Option<Orientation>,
    /// Optimistic concurrency stamp; bumped by the repository on every update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(owner_id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            video_url: None,
            storage_key: None,
            orientation: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a published asset into the record.
    pub fn apply_published(&mut self, asset: &PublishedAsset) {
        self.video_url = Some(asset.url.clone());
        self.storage_key = Some(asset.storage_key.clone());
        self.orientation = Some(asset.orientation);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(width: u32, height: u32) -> Orientation {
        Orientation::from_probe(&ProbeResult::new(width, height))
    }

    #[test]
    fn test_full_hd_is_landscape() {
        assert_eq!(classify(1920, 1080), Orientation::Landscape);
        assert_eq!(classify(1280, 720), Orientation::Landscape);
    }

    #[test]
    fn test_vertical_full_hd_is_portrait() {
        assert_eq!(classify(1080, 1920), Orientation::Portrait);
        assert_eq!(classify(720, 1280), Orientation::Portrait);
    }

    #[test]
    fn test_near_canonical_ratios() {
        // 1.85:1 is within 0.1 of 16:9
        assert_eq!(classify(1850, 1000), Orientation::Landscape);
        // 0.6 is within 0.1 of 9:16
        assert_eq!(classify(600, 1000), Orientation::Portrait);
    }

    #[test]
    fn test_square_falls_through_to_portrait() {
        assert_eq!(classify(1080, 1080), Orientation::Portrait);
    }

    #[test]
    fn test_non_standard_ratios_use_width_height_comparison() {
        // 4:3 and ultra-wide are outside both tolerances
        assert_eq!(classify(1440, 1080), Orientation::Landscape);
        assert_eq!(classify(2560, 1080), Orientation::Landscape);
        // 3:4 and very tall
        assert_eq!(classify(1080, 1440), Orientation::Portrait);
        assert_eq!(classify(500, 2000), Orientation::Portrait);
    }

    #[test]
    fn test_orientation_serializes_lowercase() {
        let json = serde_json::to_string(&Orientation::Landscape).unwrap();
        assert_eq!(json, "\"landscape\"");
        assert_eq!(Orientation::Portrait.to_string(), "portrait");
    }

    #[test]
    fn test_apply_published() {
        let mut record = VideoRecord::new(Uuid::new_v4(), "clip");
        let asset = PublishedAsset {
            storage_key: "portrait/abc.mp4".to_string(),
            url: "https://cdn.example.com/portrait/abc.mp4".to_string(),
            orientation: Orientation::Portrait,
        };
        record.apply_published(&asset);

        assert_eq!(record.storage_key.as_deref(), Some("portrait/abc.mp4"));
        assert_eq!(record.orientation, Some(Orientation::Portrait));
        assert_eq!(record.version, 0);
    }
}
