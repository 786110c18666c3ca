//! Region-of-interest geometry shared by the landmark models.
//!
//! Both MediaPipe models take a square crop; landmarks come back in crop
//! space and are mapped to frame space with a center-based transform so
//! clamped crops do not drift.

use smokewatch_models::Point2D;

/// Smallest crop side the landmark models accept.
pub const MIN_CROP_SIDE: f32 = 8.0;

/// Axis-aligned rectangle in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Roi {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Roi {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Expand by `pad_ratio`, make square around the center and clamp to the frame.
    ///
    /// The corner is floored to whole pixels and the side is clamped after
    /// rounding, so the result always fits inside the frame.
    ///
    /// Returns `None` when the clamped square is too small to run a model on.
    pub fn square_crop(&self, pad_ratio: f32, frame_width: f32, frame_height: f32) -> Option<Roi> {
        let size = self.width.max(self.height) * (1.0 + pad_ratio);
        let center = self.center();

        let mut x = center.x - size / 2.0;
        let mut y = center.y - size / 2.0;
        let mut s = size;

        if x < 0.0 {
            s += x;
            x = 0.0;
        }
        if y < 0.0 {
            s += y;
            y = 0.0;
        }

        let x = x.floor();
        let y = y.floor();
        let side = s
            .round()
            .min(frame_width - x)
            .min(frame_height - y)
            .floor();

        if side < MIN_CROP_SIDE {
            return None;
        }

        Some(Roi::new(x, y, side, side))
    }

    /// Map a point normalized to the crop (0.0 - 1.0) back to frame pixels.
    pub fn map_normalized(&self, nx: f32, ny: f32) -> Point2D {
        let center = self.center();
        let side = self.width;
        Point2D::new(
            center.x + (nx - 0.5) * side,
            center.y + (ny - 0.5) * side,
        )
    }

    /// Integer rectangle for OpenCV.
    #[cfg(feature = "opencv")]
    pub fn to_rect(&self) -> opencv::core::Rect {
        opencv::core::Rect::new(
            self.x.round() as i32,
            self.y.round() as i32,
            self.width.round() as i32,
            self.height.round() as i32,
        )
    }
}

/// Square region rotated by `rotation` radians around its center.
///
/// Positive rotation is clockwise in image coordinates (y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedRoi {
    pub center: Point2D,
    pub side: f32,
    pub rotation: f32,
}

impl RotatedRoi {
    pub fn new(center: Point2D, side: f32, rotation: f32) -> Self {
        Self {
            center,
            side,
            rotation,
        }
    }

    /// Map a point normalized to the rotated crop back to frame pixels.
    pub fn map_normalized(&self, nx: f32, ny: f32) -> Point2D {
        let dx = (nx - 0.5) * self.side;
        let dy = (ny - 0.5) * self.side;
        let (sin, cos) = self.rotation.sin_cos();
        Point2D::new(
            self.center.x + dx * cos - dy * sin,
            self.center.y + dx * sin + dy * cos,
        )
    }

    /// 2x3 matrix taking output pixels of an `output_side` square crop to
    /// frame pixels (the inverse map expected by `warp_affine`).
    pub fn inverse_affine(&self, output_side: f32) -> [[f32; 3]; 2] {
        let scale = self.side / output_side;
        let (sin, cos) = self.rotation.sin_cos();
        let (a00, a01, a10, a11) = (cos * scale, -sin * scale, sin * scale, cos * scale);
        let half = output_side / 2.0;
        [
            [a00, a01, self.center.x - (a00 + a01) * half],
            [a10, a11, self.center.y - (a10 + a11) * half],
        ]
    }
}

impl From<Roi> for RotatedRoi {
    fn from(roi: Roi) -> Self {
        RotatedRoi::new(roi.center(), roi.width.max(roi.height), 0.0)
    }
}

/// Candidate regions to search for hands: the left and right halves of the frame.
///
/// Used when no palm detection model is installed. The hand landmark model
/// reports a single hand per crop, so splitting the frame still finds two.
pub fn hand_search_regions(frame_width: f32, frame_height: f32) -> Vec<Roi> {
    let half = frame_width / 2.0;
    [
        Roi::new(0.0, 0.0, half, frame_height),
        Roi::new(half, 0.0, half, frame_height),
    ]
    .iter()
    .filter_map(|region| region.square_crop(0.0, frame_width, frame_height))
    .collect()
}
