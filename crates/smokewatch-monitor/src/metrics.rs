//! Monitor counters.
//!
//! No exporter is installed by the binaries; the counters are recorded into
//! whatever recorder the embedding process sets up, or dropped.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_TOTAL: &str = "smokewatch_frames_total";
    pub const DETECTIONS_TOTAL: &str = "smokewatch_detections_total";
    pub const ALERTS_TOTAL: &str = "smokewatch_alerts_total";
    pub const ALERT_FAILURES_TOTAL: &str = "smokewatch_alert_failures_total";
}

pub fn record_frame() {
    counter!(names::FRAMES_TOTAL).increment(1);
}

/// Record a frame classified as smoking.
pub fn record_detection() {
    counter!(names::DETECTIONS_TOTAL).increment(1);
}

pub fn record_alert(engine: &str) {
    let labels = [("engine", engine.to_string())];
    counter!(names::ALERTS_TOTAL, &labels).increment(1);
}

pub fn record_alert_failure(engine: &str) {
    let labels = [("engine", engine.to_string())];
    counter!(names::ALERT_FAILURES_TOTAL, &labels).increment(1);
}
