//! OpenCV YuNet face box detector.
//!
//! YuNet locates the face; the face mesh model then runs on a square crop
//! around the best box. It is exposed via OpenCV's FaceDetectorYN API.
//!
//! # Requirements
//! - OpenCV 4.5+ with DNN module (2023mar models need 4.8+)

use std::path::Path;

use opencv::core::{Mat, Ptr, Size};
use opencv::imgproc;
use opencv::objdetect::FaceDetectorYN;
use opencv::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{VisionError, VisionResult};
use crate::roi::Roi;

/// Score threshold for face detection.
const SCORE_THRESHOLD: f32 = 0.6;

/// NMS threshold for face detection
const NMS_THRESHOLD: f32 = 0.3;

/// Top K faces to keep
const TOP_K: i32 = 5;

/// Columns per YuNet output row:
/// [x, y, w, h, x_re, y_re, x_le, y_le, x_n, y_n, x_ml, y_ml, x_mr, y_mr, score]
const OUTPUT_COLUMNS: i32 = 15;
const SCORE_COLUMN: i32 = 14;

/// YuNet face detector using OpenCV.
pub struct YuNetDetector {
    detector: Ptr<FaceDetectorYN>,
    /// Network input size (width, height)
    input_size: (i32, i32),
}

impl YuNetDetector {
    /// Load a YuNet model, trying the default then the OpenCV DNN backend.
    pub fn new(model_path: &Path) -> VisionResult<Self> {
        use opencv::dnn::{DNN_BACKEND_DEFAULT, DNN_BACKEND_OPENCV, DNN_TARGET_CPU};

        let model = model_path.to_string_lossy();
        let input_size = (320, 320);

        let backends = [
            (DNN_BACKEND_DEFAULT, DNN_TARGET_CPU, "default"),
            (DNN_BACKEND_OPENCV, DNN_TARGET_CPU, "opencv"),
        ];

        let mut last_error = String::new();

        for (backend_id, target_id, backend_name) in backends {
            match FaceDetectorYN::create(
                &model,
                "",
                Size::new(input_size.0, input_size.1),
                SCORE_THRESHOLD,
                NMS_THRESHOLD,
                TOP_K,
                backend_id,
                target_id,
            ) {
                Ok(detector) => {
                    info!("YuNet detector initialized with {} backend: {}", backend_name, model);
                    return Ok(Self {
                        detector,
                        input_size,
                    });
                }
                Err(e) => {
                    warn!("YuNet {} backend failed: {}", backend_name, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(VisionError::detection_failed(format!(
            "Failed to create YuNet detector with any backend: {}",
            last_error
        )))
    }

    /// Network input size for a frame: scaled to at most 640 wide, multiples of 32.
    fn input_size_for(frame_width: i32, frame_height: i32) -> (i32, i32) {
        const ALIGNMENT: i32 = 32;
        let scale = (frame_width as f64 / 640.0).max(1.0);
        let w = (frame_width as f64 / scale).round() as i32;
        let h = (frame_height as f64 / scale).round() as i32;
        let align = |v: i32| (((v + ALIGNMENT / 2) / ALIGNMENT) * ALIGNMENT).max(ALIGNMENT);
        (align(w), align(h))
    }

    /// Detect face boxes in frame pixels, best score first.
    pub fn detect(&mut self, frame: &Mat) -> VisionResult<Vec<(Roi, f32)>> {
        if frame.empty() {
            return Ok(Vec::new());
        }

        let (frame_width, frame_height) = (frame.cols(), frame.rows());
        let wanted = Self::input_size_for(frame_width, frame_height);
        if wanted != self.input_size {
            self.detector.set_input_size(Size::new(wanted.0, wanted.1))?;
            self.input_size = wanted;
            debug!("YuNet input size set to {}x{}", wanted.0, wanted.1);
        }

        let mut resized = Mat::default();
        imgproc::resize(
            frame,
            &mut resized,
            Size::new(self.input_size.0, self.input_size.1),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let mut faces = Mat::default();
        self.detector
            .detect(&resized, &mut faces)
            .map_err(|e| VisionError::detection_failed(format!("YuNet detect failed: {e}")))?;

        if faces.rows() <= 0 {
            return Ok(Vec::new());
        }
        if faces.cols() < OUTPUT_COLUMNS {
            warn!(
                "YuNet output has unexpected format: {} columns (expected {})",
                faces.cols(),
                OUTPUT_COLUMNS
            );
            return Ok(Vec::new());
        }

        let scale_x = frame_width as f32 / self.input_size.0 as f32;
        let scale_y = frame_height as f32 / self.input_size.1 as f32;

        let mut results = Vec::with_capacity(faces.rows() as usize);
        for i in 0..faces.rows() {
            let x = *faces.at_2d::<f32>(i, 0)? * scale_x;
            let y = *faces.at_2d::<f32>(i, 1)? * scale_y;
            let w = *faces.at_2d::<f32>(i, 2)? * scale_x;
            let h = *faces.at_2d::<f32>(i, 3)? * scale_y;
            let score = *faces.at_2d::<f32>(i, SCORE_COLUMN)?;

            if w <= 0.0 || h <= 0.0 {
                continue;
            }
            results.push((Roi::new(x, y, w, h), score));
        }

        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_size_alignment() {
        assert_eq!(YuNetDetector::input_size_for(640, 480), (640, 480));
        assert_eq!(YuNetDetector::input_size_for(1280, 720), (640, 352));
        let (w, h) = YuNetDetector::input_size_for(333, 250);
        assert_eq!(w % 32, 0);
        assert_eq!(h % 32, 0);
    }
}
