//! Position and status types shared by the poller, session and renderer
//!
//! `StatusReport` is the raw `/status` body; everything downstream works on
//! `StatusSnapshot`, where detection and coordinates are a single variant.

use serde::{Deserialize, Serialize};

/// Normalized 2D point reported by the tracker, nominally in [0, 1]².
///
/// Out-of-range values are kept as-is.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Whether the target was seen in the latest frame, and where
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Detection {
    Detected(Position),
    #[default]
    NotDetected,
}

impl Detection {
    pub fn is_detected(&self) -> bool {
        matches!(self, Detection::Detected(_))
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Detection::Detected(pos) => Some(*pos),
            Detection::NotDetected => None,
        }
    }
}

/// Most recent report from the status source
#[derive(Clone, Debug, PartialEq)]
pub struct StatusSnapshot {
    /// Opaque target label, e.g. a color name
    pub target: String,
    pub detection: Detection,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            detection: Detection::NotDetected,
        }
    }
}

/// Target the backend starts with
pub const DEFAULT_TARGET: &str = "red";

/// Detection sensitivity parameters echoed by `/status`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivityConfig {
    /// Minimum contour area in pixels
    pub min_area: u32,
    /// 1.0 = perfect circle
    pub min_circularity: f64,
    /// Contour area over convex hull area
    pub min_solidity: f64,
}

impl SensitivityConfig {
    pub const AREA_RANGE: std::ops::RangeInclusive<u32> = 500..=5000;
    pub const AREA_STEP: f64 = 100.0;
    pub const CIRCULARITY_RANGE: std::ops::RangeInclusive<f64> = 0.1..=1.0;
    pub const SOLIDITY_RANGE: std::ops::RangeInclusive<f64> = 0.3..=1.0;
    pub const RATIO_STEP: f64 = 0.05;

    /// Clamp every field into the range the settings panel offers
    pub fn clamped(self) -> Self {
        Self {
            min_area: self
                .min_area
                .clamp(*Self::AREA_RANGE.start(), *Self::AREA_RANGE.end()),
            min_circularity: self
                .min_circularity
                .clamp(*Self::CIRCULARITY_RANGE.start(), *Self::CIRCULARITY_RANGE.end()),
            min_solidity: self
                .min_solidity
                .clamp(*Self::SOLIDITY_RANGE.start(), *Self::SOLIDITY_RANGE.end()),
        }
    }
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            min_area: 1500,
            min_circularity: 0.5,
            min_solidity: 0.7,
        }
    }
}

/// Raw `GET /status` body
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub current_target_color: String,
    pub last_detected: bool,
    pub last_rel_x: Option<f64>,
    pub last_rel_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_area: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_circularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_solidity: Option<f64>,
}

impl StatusReport {
    /// Coordinates are present exactly when the detected flag is set
    pub fn is_consistent(&self) -> bool {
        let has_coords = self.last_rel_x.is_some() && self.last_rel_y.is_some();
        let has_any = self.last_rel_x.is_some() || self.last_rel_y.is_some();
        if self.last_detected {
            has_coords
        } else {
            !has_any
        }
    }

    /// Collapse the flag and nullable coordinates into a snapshot.
    ///
    /// Inconsistent reports come out as `NotDetected`.
    pub fn to_snapshot(&self) -> StatusSnapshot {
        let detection = match (self.last_detected, self.last_rel_x, self.last_rel_y) {
            (true, Some(x), Some(y)) => Detection::Detected(Position::new(x, y)),
            _ => Detection::NotDetected,
        };
        StatusSnapshot {
            target: self.current_target_color.clone(),
            detection,
        }
    }

    /// Sensitivity echoed by the backend, if it reported all three fields
    pub fn sensitivity(&self) -> Option<SensitivityConfig> {
        Some(SensitivityConfig {
            min_area: self.min_area?,
            min_circularity: self.min_circularity?,
            min_solidity: self.min_solidity?,
        })
    }
}
