//! MediaPipe hand landmark ONNX inference.
//!
//! The landmark model reports one hand per rotated square crop together
//! with a presence score and a handedness probability. Crops come from the
//! palm detector; without a palm model the provider searches the left and
//! right halves of the frame instead. Confident hands are kept and
//! duplicates seen from overlapping crops are dropped.

use std::path::Path;

use opencv::core::Mat;
use opencv::prelude::MatTraitConst;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use smokewatch_models::{Hand, Handedness, HAND_LANDMARK_COUNT};
use tracing::{debug, warn};

use crate::error::{VisionError, VisionResult};
use crate::model_paths::ModelPaths;
use crate::palm_detection::PalmDetector;
use crate::providers::HandLandmarkProvider;
use crate::roi::{hand_search_regions, RotatedRoi};
use crate::tensor::{map_landmarks, rotated_crop_to_chw_tensor, Normalization};

/// Hand landmark network input side in pixels.
pub const HAND_LANDMARK_INPUT: i32 = 224;

/// Output tensor names of the converted MediaPipe model.
const LANDMARKS_OUTPUT: &str = "Identity";
const PRESENCE_OUTPUT: &str = "Identity_1";
const HANDEDNESS_OUTPUT: &str = "Identity_2";

/// Two detections whose wrists are closer than this fraction of the frame
/// width are the same hand.
const DUPLICATE_WRIST_RATIO: f32 = 0.08;

/// ONNX Runtime wrapper for the MediaPipe hand landmark model.
pub struct HandLandmarkDetector {
    session: Session,
}

impl HandLandmarkDetector {
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

        Ok(Self { session })
    }

    /// Run the landmark model on one hand region of a BGR frame.
    pub fn detect(&mut self, frame_bgr: &Mat, region: &RotatedRoi) -> VisionResult<Hand> {
        let tensor = rotated_crop_to_chw_tensor(frame_bgr, region, HAND_LANDMARK_INPUT, Normalization::Unit)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| VisionError::detection_failed(format!("ORT run failed: {e}")))?;

        let landmarks = outputs
            .get(LANDMARKS_OUTPUT)
            .ok_or_else(|| VisionError::detection_failed("ORT returned no hand landmarks"))?;
        let (_, data) = landmarks
            .try_extract_tensor::<f32>()
            .map_err(|e| VisionError::detection_failed(format!("ORT extract: {e}")))?;
        let points = map_landmarks(data, HAND_LANDMARK_COUNT, 3, HAND_LANDMARK_INPUT, |x, y| {
            region.map_normalized(x, y)
        });

        let score = outputs
            .get(PRESENCE_OUTPUT)
            .map(first_scalar)
            .transpose()?
            .unwrap_or(0.0);
        let handedness = match outputs.get(HANDEDNESS_OUTPUT).map(first_scalar).transpose()? {
            Some(p) if p > 0.5 => Handedness::Right,
            Some(_) => Handedness::Left,
            None => Handedness::Unknown,
        };

        Ok(Hand::new(points)
            .with_score(score)
            .with_handedness(handedness))
    }
}

fn first_scalar(value: &Value) -> VisionResult<f32> {
    let (_, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|e| VisionError::detection_failed(format!("ORT extract: {e}")))?;
    data.first()
        .copied()
        .ok_or_else(|| VisionError::detection_failed("empty scalar output"))
}

/// Keep confident, distinct hands, best score first, at most `max_hands`.
pub fn select_hands(
    candidates: Vec<Hand>,
    min_confidence: f32,
    max_hands: usize,
    frame_width: f32,
) -> Vec<Hand> {
    let mut confident: Vec<Hand> = candidates
        .into_iter()
        .filter(|hand| hand.score >= min_confidence && hand.landmark_list.len() == HAND_LANDMARK_COUNT)
        .collect();
    confident.sort_by(|a, b| b.score.total_cmp(&a.score));

    let min_separation = frame_width * DUPLICATE_WRIST_RATIO;
    let mut selected: Vec<Hand> = Vec::with_capacity(max_hands);
    for hand in confident {
        if selected.len() >= max_hands {
            break;
        }
        let duplicate = selected.iter().any(|kept| match (kept.wrist(), hand.wrist()) {
            (Some(a), Some(b)) => a.distance(&b) < min_separation,
            _ => false,
        });
        if !duplicate {
            selected.push(hand);
        }
    }
    selected
}

/// Hand landmark provider: palm regions, or both frame halves without a
/// palm model.
pub struct OrtHandProvider {
    palms: Option<PalmDetector>,
    detector: HandLandmarkDetector,
    min_confidence: f32,
    max_hands: usize,
}

impl OrtHandProvider {
    pub fn new(paths: &ModelPaths, min_confidence: f32, max_hands: usize) -> VisionResult<Self> {
        let palms = match &paths.palm_detection {
            Some(path) => Some(PalmDetector::load(path)?),
            None => {
                warn!("No palm detection model found, searching frame halves for hands");
                None
            }
        };

        Ok(Self {
            palms,
            detector: HandLandmarkDetector::load(&paths.hand_landmark)?,
            min_confidence,
            max_hands,
        })
    }

    fn regions(&mut self, frame: &Mat) -> VisionResult<Vec<RotatedRoi>> {
        match &mut self.palms {
            Some(palms) => Ok(palms
                .detect(frame)?
                .iter()
                .take(self.max_hands)
                .map(|palm| palm.hand_region())
                .collect()),
            None => Ok(hand_search_regions(frame.cols() as f32, frame.rows() as f32)
                .into_iter()
                .map(RotatedRoi::from)
                .collect()),
        }
    }
}

impl HandLandmarkProvider<Mat> for OrtHandProvider {
    fn find(&mut self, frame: &Mat) -> VisionResult<Vec<Hand>> {
        let regions = self.regions(frame)?;

        let mut candidates = Vec::with_capacity(regions.len());
        for region in &regions {
            candidates.push(self.detector.detect(frame, region)?);
        }

        let hands = select_hands(candidates, self.min_confidence, self.max_hands, frame.cols() as f32);
        for hand in &hands {
            debug!(score = hand.score, handedness = hand.handedness.as_str(), "Hand landmarks detected");
        }
        Ok(hands)
    }

    fn name(&self) -> &'static str {
        "mediapipe_hands"
    }
}
