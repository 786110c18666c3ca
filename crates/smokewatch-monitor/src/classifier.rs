//! Hand-to-mouth proximity heuristic.
//!
//! A frame counts as smoking when any tracked index fingertip is strictly
//! closer to the nose tip than the configured threshold. Frames are judged
//! independently; there is no smoothing across frames.

use smokewatch_models::{FaceLandmarks, Hand, MonitorStatus};

/// Smallest nose to index fingertip distance in pixels.
///
/// `None` when there is no nose landmark or no hand with an index fingertip.
pub fn nearest_fingertip_distance(face: &FaceLandmarks, hands: &[Hand]) -> Option<f32> {
    let nose = face.nose_tip()?;
    hands
        .iter()
        .filter_map(Hand::index_finger_tip)
        .map(|tip| nose.distance(&tip))
        .min_by(f32::total_cmp)
}

/// Whether any hand's index fingertip is within `threshold_px` of the nose.
pub fn is_smoking(face: &FaceLandmarks, hands: &[Hand], threshold_px: f32) -> bool {
    nearest_fingertip_distance(face, hands).is_some_and(|d| d < threshold_px)
}

/// Frame verdict for the overlay: no face means no decision.
pub fn classify(face: &FaceLandmarks, hands: &[Hand], threshold_px: f32) -> MonitorStatus {
    if face.is_empty() {
        MonitorStatus::NoFace
    } else if is_smoking(face, hands, threshold_px) {
        MonitorStatus::SmokingDetected
    } else {
        MonitorStatus::Normal
    }
}
