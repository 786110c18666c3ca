//! Model file discovery.
//!
//! # Model Download
//! ```bash
//! mkdir -p models
//! curl -L -o models/face_detection_yunet_2023mar.onnx \
//!   "https://github.com/opencv/opencv_zoo/raw/main/models/face_detection_yunet/face_detection_yunet_2023mar.onnx"
//! # MediaPipe face mesh and hand landmark models converted to ONNX:
//! #   models/face_landmark.onnx   (1x3x192x192 -> 1x468x3)
//! #   models/hand_landmark.onnx   (1x3x224x224 -> 1x63, presence, handedness)
//! # Optional palm detector (1x3x192x192 -> 1x2016x18, 1x2016x1):
//! #   models/palm_detection.onnx
//! ```
//!
//! Without a palm detector the hand model searches fixed frame halves.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{VisionError, VisionResult};

/// YuNet face box model file names, preferred first.
pub const FACE_DETECTOR_FILES: &[&str] = &[
    "face_detection_yunet_2023mar.onnx",
    "face_detection_yunet_2023mar_int8.onnx",
    "face_detection_yunet_2022mar.onnx",
];

pub const FACE_MESH_FILE: &str = "face_landmark.onnx";
pub const HAND_LANDMARK_FILE: &str = "hand_landmark.onnx";

/// Palm detector file names, preferred first.
pub const PALM_DETECTION_FILES: &[&str] = &[
    "palm_detection.onnx",
    "palm_detection_full.onnx",
    "palm_detection_lite.onnx",
];

/// Resolved locations of every model the monitor loads.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPaths {
    pub face_detector: PathBuf,
    pub face_mesh: PathBuf,
    pub hand_landmark: PathBuf,
    pub palm_detection: Option<PathBuf>,
}

impl ModelPaths {
    /// Locate all models under `model_dir`.
    ///
    /// Fails with `VisionError::ModelNotFound` naming the first missing
    /// required file. The palm detector is optional.
    pub fn resolve(model_dir: &Path) -> VisionResult<Self> {
        let face_detector = FACE_DETECTOR_FILES
            .iter()
            .map(|name| model_dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| {
                VisionError::model_not_found(model_dir.join(FACE_DETECTOR_FILES[0]).display().to_string())
            })?;

        let face_mesh = require(model_dir.join(FACE_MESH_FILE))?;
        let hand_landmark = require(model_dir.join(HAND_LANDMARK_FILE))?;
        let palm_detection = PALM_DETECTION_FILES
            .iter()
            .map(|name| model_dir.join(name))
            .find(|path| path.exists());

        debug!(
            face_detector = %face_detector.display(),
            face_mesh = %face_mesh.display(),
            hand_landmark = %hand_landmark.display(),
            palm_detection = ?palm_detection,
            "Resolved model paths"
        );

        Ok(Self {
            face_detector,
            face_mesh,
            hand_landmark,
            palm_detection,
        })
    }

    /// Every resolved model path, for diagnostics.
    pub fn all(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = vec![&self.face_detector, &self.face_mesh, &self.hand_landmark];
        paths.extend(self.palm_detection.as_deref());
        paths
    }
}

fn require(path: PathBuf) -> VisionResult<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(VisionError::model_not_found(path.display().to_string()))
    }
}
