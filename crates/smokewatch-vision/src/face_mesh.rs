//! MediaPipe Face Mesh ONNX inference.
//!
//! YuNet supplies the face box; the mesh model runs on an expanded square
//! crop of it and returns 468 landmarks. Index 1 is the nose tip.
//!
//! The model emits coordinates in 192x192 input pixels; they are
//! normalized and mapped back to frame space using a center-based transform
//! to avoid drift when the ROI is clamped.

use std::path::Path;

use opencv::core::Mat;
use opencv::prelude::MatTraitConst;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use smokewatch_models::{FaceLandmarks, Point2D};
use tracing::debug;

use crate::error::{VisionError, VisionResult};
use crate::model_paths::ModelPaths;
use crate::providers::FaceLandmarkProvider;
use crate::roi::Roi;
use crate::tensor::{crop_to_chw_tensor, map_landmarks, Normalization};
use crate::yunet::YuNetDetector;

/// Face mesh network input side in pixels.
pub const FACE_MESH_INPUT: i32 = 192;

/// Face mesh output tensor name.
const OUTPUT_NAME: &str = "output";

/// Extra context around the YuNet box before squaring.
const CROP_PADDING: f32 = 0.25;

/// ONNX Runtime wrapper for the MediaPipe Face Mesh model.
pub struct FaceMeshDetector {
    session: Session,
}

impl FaceMeshDetector {
    pub fn load(model_path: &Path) -> VisionResult<Self> {
        if !model_path.exists() {
            return Err(VisionError::model_not_found(model_path.display().to_string()));
        }

        let model_bytes = std::fs::read(model_path)?;

        let session = Session::builder()
            .map_err(|e| VisionError::detection_failed(format!("ORT session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| VisionError::detection_failed(format!("ORT opt level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| VisionError::detection_failed(format!("ORT load model: {e}")))?;

        Ok(Self { session })
    }

    /// Run face mesh on a face box inside the full frame (BGR Mat).
    pub fn detect(&mut self, frame_bgr: &Mat, face_box: &Roi) -> VisionResult<Vec<Point2D>> {
        let crop = face_box
            .square_crop(CROP_PADDING, frame_bgr.cols() as f32, frame_bgr.rows() as f32)
            .ok_or_else(|| VisionError::detection_failed("ROI too small for face mesh"))?;

        let tensor = crop_to_chw_tensor(frame_bgr, &crop, FACE_MESH_INPUT, Normalization::SignedUnit)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| VisionError::detection_failed(format!("ORT run failed: {e}")))?;

        let output = outputs
            .get(OUTPUT_NAME)
            .ok_or_else(|| VisionError::detection_failed("ORT returned no face mesh output"))?;

        extract_landmarks(output, &crop)
    }
}

/// Extract landmarks and map them back to frame coordinates.
fn extract_landmarks(output: &Value, crop: &Roi) -> VisionResult<Vec<Point2D>> {
    let (shape, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| VisionError::detection_failed(format!("ORT extract: {e}")))?;

    // Accept [1,468,3], [468,3] or flat [1,1404]
    let (points, stride) = match shape.len() {
        3 if shape[0] == 1 => (shape[1] as usize, shape[2] as usize),
        2 if shape[0] == 1 => (shape[1] as usize / 3, 3),
        2 => (shape[0] as usize, shape[1] as usize),
        _ => {
            return Err(VisionError::detection_failed(format!(
                "Unexpected face mesh output shape: {:?}",
                shape
            )))
        }
    };

    Ok(map_landmarks(data, points, stride, FACE_MESH_INPUT, |x, y| {
        crop.map_normalized(x, y)
    }))
}

/// Face landmark provider: YuNet box + MediaPipe face mesh.
///
/// Returns at most one face (the highest-scoring YuNet box).
pub struct OrtFaceMeshProvider {
    locator: YuNetDetector,
    mesh: FaceMeshDetector,
}

impl OrtFaceMeshProvider {
    pub fn new(paths: &ModelPaths) -> VisionResult<Self> {
        Ok(Self {
            locator: YuNetDetector::new(&paths.face_detector)?,
            mesh: FaceMeshDetector::load(&paths.face_mesh)?,
        })
    }
}

impl FaceLandmarkProvider<Mat> for OrtFaceMeshProvider {
    fn find(&mut self, frame: &Mat) -> VisionResult<Vec<FaceLandmarks>> {
        let boxes = self.locator.detect(frame)?;
        let Some((face_box, score)) = boxes.first().copied() else {
            return Ok(Vec::new());
        };

        let points = self.mesh.detect(frame, &face_box)?;
        debug!(score, landmarks = points.len(), "Face mesh detected");
        Ok(vec![FaceLandmarks::new(points)])
    }

    fn name(&self) -> &'static str {
        "yunet_face_mesh"
    }
}
