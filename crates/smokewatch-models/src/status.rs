//! Per-frame verdicts and overlay annotations.

use serde::{Deserialize, Serialize};

use crate::landmarks::Hand;
use crate::point::Point2D;

/// Outcome of evaluating one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStatus {
    /// No face in view; no decision was made.
    #[default]
    NoFace,
    Normal,
    SmokingDetected,
}

impl MonitorStatus {
    pub fn is_smoking(&self) -> bool {
        matches!(self, MonitorStatus::SmokingDetected)
    }

    /// Status line shown on the preview window, if any.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            MonitorStatus::NoFace => None,
            MonitorStatus::Normal => Some("Status: Normal"),
            MonitorStatus::SmokingDetected => Some("Status: Smoking Detected!"),
        }
    }
}

/// Everything the overlay renderer needs to draw for one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameAnnotations {
    pub status: MonitorStatus,
    pub nose: Option<Point2D>,
    pub hands: Vec<Hand>,
    /// Closest nose-to-fingertip distance in pixels, when both were seen.
    pub nearest_distance: Option<f32>,
    pub fps: f64,
}
