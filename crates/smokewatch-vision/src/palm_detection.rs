//! MediaPipe palm detection and palm-to-hand region conversion.
//!
//! The palm model is an SSD over a 192x192 letterboxed frame. Each of its
//! 2016 anchors regresses a palm box plus seven palm keypoints. Confident,
//! non-overlapping palms are turned into rotated square hand regions: the
//! box is shifted towards the fingers, scaled by 2.6 and aligned so the
//! wrist-to-middle-finger axis points up, which is what the hand landmark
//! model was trained on.

use std::f32::consts::{FRAC_PI_2, PI};

use smokewatch_models::Point2D;

use crate::roi::RotatedRoi;

/// Palm detector input side in pixels.
pub const PALM_INPUT: usize = 192;

/// Values per anchor: box (cx, cy, w, h) and 7 keypoints.
pub const PALM_REGRESSOR_STRIDE: usize = 18;

/// SSD feature map strides; layers sharing a stride share one grid.
const ANCHOR_STRIDES: [usize; 4] = [8, 16, 16, 16];
const ANCHORS_PER_LAYER: usize = 2;

/// Sigmoid inputs are clipped to this range before activation.
const SCORE_CLIP: f32 = 100.0;

/// Keypoints used to orient the hand region.
const WRIST_CENTER_KEYPOINT: usize = 0;
const MIDDLE_FINGER_KEYPOINT: usize = 2;

/// Palm box to hand region expansion.
const HAND_REGION_SCALE: f32 = 2.6;
const HAND_REGION_SHIFT_Y: f32 = -0.5;

/// Anchor center normalized to the model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

/// Palm found by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct PalmDetection {
    pub center: Point2D,
    pub width: f32,
    pub height: f32,
    pub keypoints: Vec<Point2D>,
    pub score: f32,
}

impl PalmDetection {
    /// Apply `map` to every point and `scale` to the box size.
    pub fn transformed(&self, scale: f32, map: impl Fn(Point2D) -> Point2D) -> PalmDetection {
        PalmDetection {
            center: map(self.center),
            width: self.width * scale,
            height: self.height * scale,
            keypoints: self.keypoints.iter().copied().map(&map).collect(),
            score: self.score,
        }
    }

    /// Intersection over union of the axis-aligned boxes.
    pub fn iou(&self, other: &PalmDetection) -> f32 {
        let x1 = (self.center.x - self.width / 2.0).max(other.center.x - other.width / 2.0);
        let y1 = (self.center.y - self.height / 2.0).max(other.center.y - other.height / 2.0);
        let x2 = (self.center.x + self.width / 2.0).min(other.center.x + other.width / 2.0);
        let y2 = (self.center.y + self.height / 2.0).min(other.center.y + other.height / 2.0);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.width * self.height + other.width * other.height - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Rotated square region around the whole hand, in the palm's units.
    pub fn hand_region(&self) -> RotatedRoi {
        let rotation = match (
            self.keypoints.get(WRIST_CENTER_KEYPOINT),
            self.keypoints.get(MIDDLE_FINGER_KEYPOINT),
        ) {
            (Some(wrist), Some(middle)) => {
                normalize_radians(FRAC_PI_2 - (-(middle.y - wrist.y)).atan2(middle.x - wrist.x))
            }
            _ => 0.0,
        };

        let (sin, cos) = rotation.sin_cos();
        let shift = self.height * HAND_REGION_SHIFT_Y;
        let center = Point2D::new(self.center.x - shift * sin, self.center.y + shift * cos);

        RotatedRoi::new(center, self.width.max(self.height) * HAND_REGION_SCALE, rotation)
    }
}

fn normalize_radians(angle: f32) -> f32 {
    angle - 2.0 * PI * ((angle + PI) / (2.0 * PI)).floor()
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x.clamp(-SCORE_CLIP, SCORE_CLIP)).exp())
}

/// SSD anchor centers for a square input of `input_side` pixels.
pub fn generate_anchors(input_side: usize) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    let mut layer = 0;

    while layer < ANCHOR_STRIDES.len() {
        let stride = ANCHOR_STRIDES[layer];
        let mut per_cell = 0;
        while layer < ANCHOR_STRIDES.len() && ANCHOR_STRIDES[layer] == stride {
            per_cell += ANCHORS_PER_LAYER;
            layer += 1;
        }

        let cells = input_side.div_ceil(stride);
        for y in 0..cells {
            for x in 0..cells {
                let anchor = Anchor {
                    x: (x as f32 + 0.5) / cells as f32,
                    y: (y as f32 + 0.5) / cells as f32,
                };
                anchors.extend(std::iter::repeat_n(anchor, per_cell));
            }
        }
    }

    anchors
}

/// Decode raw regressors and logits into palms normalized to the input.
///
/// `regressors` holds [`PALM_REGRESSOR_STRIDE`] values per anchor and
/// `logits` one value per anchor. Palms below `min_score` are dropped.
pub fn decode_palms(
    regressors: &[f32],
    logits: &[f32],
    anchors: &[Anchor],
    input_side: usize,
    min_score: f32,
) -> Vec<PalmDetection> {
    let side = input_side as f32;

    anchors
        .iter()
        .zip(logits)
        .zip(regressors.chunks_exact(PALM_REGRESSOR_STRIDE))
        .filter_map(|((anchor, &logit), raw)| {
            let score = sigmoid(logit);
            if score < min_score {
                return None;
            }

            let keypoints = raw[4..]
                .chunks_exact(2)
                .map(|k| Point2D::new(k[0] / side + anchor.x, k[1] / side + anchor.y))
                .collect();

            Some(PalmDetection {
                center: Point2D::new(raw[0] / side + anchor.x, raw[1] / side + anchor.y),
                width: raw[2] / side,
                height: raw[3] / side,
                keypoints,
                score,
            })
        })
        .collect()
}

/// Keep the best palm of each overlapping group.
pub fn non_maximum_suppression(mut palms: Vec<PalmDetection>, iou_threshold: f32) -> Vec<PalmDetection> {
    if palms.is_empty() {
        return palms;
    }

    palms.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<PalmDetection> = Vec::new();
    let mut suppressed = vec![false; palms.len()];

    for i in 0..palms.len() {
        if suppressed[i] {
            continue;
        }

        for j in (i + 1)..palms.len() {
            if !suppressed[j] && palms[i].iou(&palms[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }

        keep.push(palms[i].clone());
    }

    keep
}

#[cfg(feature = "opencv")]
pub use detector::PalmDetector;

#[cfg(feature = "opencv")]
mod detector {
    use std::path::Path;

    use opencv::core::Mat;
    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use ort::value::Value;
    use tracing::debug;

    use super::{decode_palms, generate_anchors, non_maximum_suppression, Anchor, PalmDetection};
    use super::{PALM_INPUT, PALM_REGRESSOR_STRIDE};
    use crate::error::{VisionError, VisionResult};
    use crate::tensor::{letterbox_to_chw_tensor, Normalization};

    /// Output names differ between converted model releases.
    const REGRESSOR_OUTPUTS: [&str; 2] = ["regressors", "Identity"];
    const SCORE_OUTPUTS: [&str; 2] = ["classificators", "Identity_1"];

    const MIN_PALM_SCORE: f32 = 0.5;
    const NMS_THRESHOLD: f32 = 0.3;

    /// ONNX Runtime wrapper for the MediaPipe palm detection model.
    pub struct PalmDetector {
        session: Session,
        anchors: Vec<Anchor>,
    }

    impl PalmDetector {
        pub fn load(model_path: &Path) -> VisionResult<Self> {
            if !model_path.exists() {
                return Err(VisionError::model_not_found(model_path.display().to_string()));
            }

            let model_bytes = std::fs::read(model_path)?;
            let session = Session::builder()
                .map_err(|e| VisionError::detection_failed(format!("ORT session builder: {e}")))?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| VisionError::detection_failed(format!("ORT opt level: {e}")))?
                .commit_from_memory(&model_bytes)
                .map_err(|e| VisionError::detection_failed(format!("ORT load model: {e}")))?;

            Ok(Self {
                session,
                anchors: generate_anchors(PALM_INPUT),
            })
        }

        /// Palms in frame pixels, best first.
        pub fn detect(&mut self, frame_bgr: &Mat) -> VisionResult<Vec<PalmDetection>> {
            let (tensor, letterbox) =
                letterbox_to_chw_tensor(frame_bgr, PALM_INPUT as i32, Normalization::Unit)?;

            let outputs = self
                .session
                .run(ort::inputs![tensor])
                .map_err(|e| VisionError::detection_failed(format!("ORT run failed: {e}")))?;

            let regressors = extract(REGRESSOR_OUTPUTS.iter().find_map(|name| outputs.get(*name)))?;
            let logits = extract(SCORE_OUTPUTS.iter().find_map(|name| outputs.get(*name)))?;
            if regressors.len() != self.anchors.len() * PALM_REGRESSOR_STRIDE
                || logits.len() != self.anchors.len()
            {
                return Err(VisionError::detection_failed(format!(
                    "Unexpected palm output sizes: {} regressors, {} scores for {} anchors",
                    regressors.len(),
                    logits.len(),
                    self.anchors.len()
                )));
            }

            let palms = decode_palms(regressors, logits, &self.anchors, PALM_INPUT, MIN_PALM_SCORE);
            let palms = non_maximum_suppression(palms, NMS_THRESHOLD);
            debug!(palms = palms.len(), "Palms detected");

            let scale = letterbox.side as f32;
            Ok(palms
                .iter()
                .map(|palm| palm.transformed(scale, |p| letterbox.to_frame(p)))
                .collect())
        }
    }

    fn extract(value: Option<&Value>) -> VisionResult<&[f32]> {
        let value = value.ok_or_else(|| VisionError::detection_failed("ORT returned no palm output"))?;
        let (_, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::detection_failed(format!("ORT extract: {e}")))?;
        Ok(data)
    }
}
