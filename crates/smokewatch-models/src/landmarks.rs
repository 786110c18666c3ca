//! Face mesh and hand landmark sets.
//!
//! Index conventions follow the MediaPipe models the vision crate runs:
//!
//! - Face mesh: 468 points, index 1 is the nose tip.
//! - Hand: 21 joints, index 0 is the wrist, index 8 is the index fingertip.

use serde::{Deserialize, Serialize};

use crate::point::Point2D;

/// Face mesh index of the nose tip.
pub const NOSE_TIP: usize = 1;

/// Hand landmark index of the wrist.
pub const WRIST: usize = 0;

/// Hand landmark index of the index fingertip.
pub const INDEX_FINGER_TIP: usize = 8;

/// Number of joints reported per hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Ordered face mesh landmarks for a single face.
///
/// An empty set means no face was found in the frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub points: Vec<Point2D>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Landmark set for "no face this frame".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, index: usize) -> Option<Point2D> {
        self.points.get(index).copied()
    }

    /// Nose tip, if the detector returned enough points.
    pub fn nose_tip(&self) -> Option<Point2D> {
        self.get(NOSE_TIP)
    }
}

/// Which hand the detector believes it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
            Handedness::Unknown => "unknown",
        }
    }
}

/// A detected hand.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hand {
    /// Joint positions in frame coordinates.
    pub landmark_list: Vec<Point2D>,
    /// Detector presence score (0.0 - 1.0).
    pub score: f32,
    pub handedness: Handedness,
}

impl Hand {
    /// Create a hand from joints with full confidence and unknown handedness.
    pub fn new(landmark_list: Vec<Point2D>) -> Self {
        Self {
            landmark_list,
            score: 1.0,
            handedness: Handedness::Unknown,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn with_handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = handedness;
        self
    }

    pub fn get(&self, index: usize) -> Option<Point2D> {
        self.landmark_list.get(index).copied()
    }

    /// Index fingertip, if the detector returned enough joints.
    pub fn index_finger_tip(&self) -> Option<Point2D> {
        self.get(INDEX_FINGER_TIP)
    }

    pub fn wrist(&self) -> Option<Point2D> {
        self.get(WRIST)
    }
}
