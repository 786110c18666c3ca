//! Error types for vision operations.

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur while capturing, detecting or displaying frames.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Camera {0} could not be opened")]
    CameraUnavailable(i32),

    #[error("Failed to grab frame: {0}")]
    CaptureFailed(String),

    #[error("Landmark detection failed: {0}")]
    DetectionFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),
}

impl VisionError {
    /// Create a capture failure error.
    pub fn capture_failed(message: impl Into<String>) -> Self {
        Self::CaptureFailed(message.into())
    }

    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create a display error.
    pub fn display(message: impl Into<String>) -> Self {
        Self::Display(message.into())
    }

    /// Whether this error means the frame source is gone.
    pub fn is_capture_failure(&self) -> bool {
        matches!(
            self,
            VisionError::CaptureFailed(_) | VisionError::CameraUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_failure_classification() {
        assert!(VisionError::capture_failed("empty frame").is_capture_failure());
        assert!(VisionError::CameraUnavailable(0).is_capture_failure());
        assert!(!VisionError::detection_failed("bad tensor").is_capture_failure());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            VisionError::capture_failed("empty frame").to_string(),
            "Failed to grab frame: empty frame"
        );
        assert_eq!(
            VisionError::CameraUnavailable(2).to_string(),
            "Camera 2 could not be opened"
        );
    }
}
