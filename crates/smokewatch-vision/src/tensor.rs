//! Frame to ONNX tensor conversion shared by the landmark models.
//!
//! OpenCV delivers frames as BGR; every model here expects RGB in NCHW
//! layout, so all crops go through [`bgr_to_chw_tensor`].

use opencv::core::{self, Mat, Scalar, Size};
use opencv::imgproc;
use opencv::prelude::{MatTraitConst, MatTraitConstManual};
use ort::value::{Tensor, Value};
use smokewatch_models::Point2D;

use crate::error::{VisionError, VisionResult};
use crate::roi::{Roi, RotatedRoi};

/// Pixel normalization expected by a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Normalization {
    /// [0, 255] -> [-1, 1]
    SignedUnit,
    /// [0, 255] -> [0, 1]
    Unit,
}

/// Convert a square BGR Mat to a (1, 3, side, side) RGB tensor.
pub(crate) fn bgr_to_chw_tensor(bgr: &Mat, normalization: Normalization) -> VisionResult<Value> {
    let mut rgb = Mat::default();
    imgproc::cvt_color(
        bgr,
        &mut rgb,
        imgproc::COLOR_BGR2RGB,
        0,
        core::AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;

    if rgb.channels() != 3 {
        return Err(VisionError::detection_failed("Expected 3-channel RGB Mat"));
    }

    let (h, w) = (rgb.rows() as usize, rgb.cols() as usize);
    let data = rgb.data_typed::<u8>()?;

    let mut chw = Vec::with_capacity(h * w * 3);
    // HWC -> CHW
    for c in 0..3 {
        for y in 0..h {
            for x in 0..w {
                let v = data[y * w * 3 + x * 3 + c] as f32 / 255.0;
                chw.push(match normalization {
                    Normalization::SignedUnit => v * 2.0 - 1.0,
                    Normalization::Unit => v,
                });
            }
        }
    }

    let shape = vec![1usize, 3, h, w];
    Tensor::from_array((shape, chw.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| VisionError::detection_failed(format!("ORT tensor: {e}")))
}

/// Crop an axis-aligned region and resize it to `side` x `side`.
pub(crate) fn crop_to_chw_tensor(
    frame_bgr: &Mat,
    crop: &Roi,
    side: i32,
    normalization: Normalization,
) -> VisionResult<Value> {
    let roi = Mat::roi(frame_bgr, crop.to_rect())?;

    let mut resized = Mat::default();
    imgproc::resize(
        &roi,
        &mut resized,
        Size::new(side, side),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    bgr_to_chw_tensor(&resized, normalization)
}

/// Sample a rotated square region into a `side` x `side` tensor.
///
/// Pixels outside the frame are black.
pub(crate) fn rotated_crop_to_chw_tensor(
    frame_bgr: &Mat,
    region: &RotatedRoi,
    side: i32,
    normalization: Normalization,
) -> VisionResult<Value> {
    let [[a00, a01, bx], [a10, a11, by]] = region.inverse_affine(side as f32);
    let matrix = Mat::from_slice_2d(&[
        [a00 as f64, a01 as f64, bx as f64],
        [a10 as f64, a11 as f64, by as f64],
    ])?;

    let mut warped = Mat::default();
    imgproc::warp_affine(
        frame_bgr,
        &mut warped,
        &matrix,
        Size::new(side, side),
        imgproc::INTER_LINEAR | imgproc::WARP_INVERSE_MAP,
        core::BORDER_CONSTANT,
        Scalar::default(),
    )?;

    bgr_to_chw_tensor(&warped, normalization)
}

/// Pad a frame to a centred square and resize it to `side` x `side`.
///
/// Returns the tensor and the padded square side with the left/top padding,
/// needed to map detections back to frame pixels.
pub(crate) fn letterbox_to_chw_tensor(
    frame_bgr: &Mat,
    side: i32,
    normalization: Normalization,
) -> VisionResult<(Value, Letterbox)> {
    let letterbox = Letterbox::for_frame(frame_bgr.cols(), frame_bgr.rows());

    let mut padded = Mat::default();
    core::copy_make_border(
        frame_bgr,
        &mut padded,
        letterbox.pad_top,
        letterbox.side - frame_bgr.rows() - letterbox.pad_top,
        letterbox.pad_left,
        letterbox.side - frame_bgr.cols() - letterbox.pad_left,
        core::BORDER_CONSTANT,
        Scalar::default(),
    )?;

    let mut resized = Mat::default();
    imgproc::resize(
        &padded,
        &mut resized,
        Size::new(side, side),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;

    Ok((bgr_to_chw_tensor(&resized, normalization)?, letterbox))
}

/// Square padding applied around a frame before a full-frame model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Letterbox {
    pub side: i32,
    pub pad_left: i32,
    pub pad_top: i32,
}

impl Letterbox {
    pub fn for_frame(width: i32, height: i32) -> Self {
        let side = width.max(height);
        Self {
            side,
            pad_left: (side - width) / 2,
            pad_top: (side - height) / 2,
        }
    }

    /// Map a point normalized to the padded square back to frame pixels.
    pub fn to_frame(&self, normalized: Point2D) -> Point2D {
        let side = self.side as f32;
        Point2D::new(
            normalized.x * side - self.pad_left as f32,
            normalized.y * side - self.pad_top as f32,
        )
    }
}

/// Map (x, y, ...) tuples given in model input pixels to frame space.
pub(crate) fn map_landmarks(
    data: &[f32],
    points: usize,
    stride: usize,
    input_side: i32,
    to_frame: impl Fn(f32, f32) -> Point2D,
) -> Vec<Point2D> {
    if stride < 2 {
        return Vec::new();
    }
    let side = input_side as f32;
    data.chunks_exact(stride)
        .take(points)
        .map(|p| to_frame(p[0] / side, p[1] / side))
        .collect()
}
