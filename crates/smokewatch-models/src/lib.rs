//! Shared data models for smokewatch.
//!
//! This crate provides plain, Serde-serializable types for:
//! - Image-space points
//! - Face mesh and hand landmark sets
//! - Per-frame monitor status and overlay annotations

pub mod landmarks;
pub mod point;
pub mod status;

pub use landmarks::{
    FaceLandmarks, Hand, Handedness, HAND_LANDMARK_COUNT, INDEX_FINGER_TIP, NOSE_TIP, WRIST,
};
pub use point::Point2D;
pub use status::{FrameAnnotations, MonitorStatus};
