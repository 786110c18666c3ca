//! Status overlay drawn onto the preview frame.

use opencv::core::{Mat, Point, Rect, Scalar};
use opencv::imgproc;
use opencv::prelude::MatTraitConst;
use smokewatch_models::{FrameAnnotations, MonitorStatus};

use crate::error::VisionResult;
use crate::providers::FrameRenderer;

const BANNER_TEXT: &str = "SMOKING DETECTED!";
const BORDER_THICKNESS: i32 = 10;
const NOSE_RADIUS: i32 = 5;
const HAND_DOT_RADIUS: i32 = 3;
const STATUS_ORIGIN: (i32, i32) = (10, 30);
const FPS_ORIGIN: (i32, i32) = (10, 70);
const DISTANCE_ORIGIN: (i32, i32) = (10, 110);
const TEXT_SCALE: f64 = 0.8;
const TEXT_THICKNESS: i32 = 2;
const BANNER_SCALE: f64 = 1.2;
const BANNER_THICKNESS: i32 = 3;
/// Roughly half the banner width at [`BANNER_SCALE`].
const BANNER_HALF_WIDTH: i32 = 150;

// BGR
fn red() -> Scalar {
    Scalar::new(0.0, 0.0, 255.0, 0.0)
}

fn green() -> Scalar {
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

fn blue() -> Scalar {
    Scalar::new(255.0, 0.0, 0.0, 0.0)
}

fn yellow() -> Scalar {
    Scalar::new(0.0, 255.0, 255.0, 0.0)
}

/// Bottom-left origin of the alarm banner.
pub fn banner_origin(frame_width: i32, frame_height: i32) -> (i32, i32) {
    (frame_width / 2 - BANNER_HALF_WIDTH, frame_height / 2)
}

/// Nose to nearest fingertip readout, when a hand was measured.
pub fn distance_label(nearest_distance: Option<f32>) -> Option<String> {
    nearest_distance.map(|d| format!("Distance: {:.0} px", d))
}

/// OpenCV implementation of [`FrameRenderer`].
#[derive(Debug, Clone, Copy)]
pub struct OverlayRenderer {
    /// Draw hand joints as dots.
    pub draw_hands: bool,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self { draw_hands: true }
    }

    fn put_text(frame: &mut Mat, text: &str, origin: (i32, i32), scale: f64, color: Scalar, thickness: i32) -> VisionResult<()> {
        imgproc::put_text(
            frame,
            text,
            Point::new(origin.0, origin.1),
            imgproc::FONT_HERSHEY_SIMPLEX,
            scale,
            color,
            thickness,
            imgproc::LINE_AA,
            false,
        )?;
        Ok(())
    }

    fn draw_alarm(frame: &mut Mat) -> VisionResult<()> {
        let (width, height) = (frame.cols(), frame.rows());

        imgproc::rectangle(
            frame,
            Rect::new(0, 0, width, height),
            red(),
            BORDER_THICKNESS,
            imgproc::LINE_8,
            0,
        )?;

        Self::put_text(
            frame,
            BANNER_TEXT,
            banner_origin(width, height),
            BANNER_SCALE,
            red(),
            BANNER_THICKNESS,
        )
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRenderer<Mat> for OverlayRenderer {
    fn render(&mut self, frame: &mut Mat, annotations: &FrameAnnotations) -> VisionResult<()> {
        if let Some(nose) = annotations.nose {
            let (x, y) = nose.to_pixel();
            imgproc::circle(
                frame,
                Point::new(x, y),
                NOSE_RADIUS,
                blue(),
                imgproc::FILLED,
                imgproc::LINE_8,
                0,
            )?;
        }

        if self.draw_hands {
            for joint in annotations.hands.iter().flat_map(|h| h.landmark_list.iter()) {
                let (x, y) = joint.to_pixel();
                imgproc::circle(
                    frame,
                    Point::new(x, y),
                    HAND_DOT_RADIUS,
                    yellow(),
                    imgproc::FILLED,
                    imgproc::LINE_8,
                    0,
                )?;
            }
        }

        if let Some(label) = annotations.status.label() {
            let color = match annotations.status {
                MonitorStatus::SmokingDetected => red(),
                _ => green(),
            };
            Self::put_text(frame, label, STATUS_ORIGIN, TEXT_SCALE, color, TEXT_THICKNESS)?;
        }

        if annotations.status.is_smoking() {
            Self::draw_alarm(frame)?;
        }

        if let Some(distance) = distance_label(annotations.nearest_distance) {
            Self::put_text(frame, &distance, DISTANCE_ORIGIN, TEXT_SCALE, yellow(), TEXT_THICKNESS)?;
        }

        let fps = format!("FPS: {:.0}", annotations.fps);
        Self::put_text(frame, &fps, FPS_ORIGIN, TEXT_SCALE, green(), TEXT_THICKNESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_origin() {
        assert_eq!(banner_origin(640, 480), (170, 240));
        assert_eq!(banner_origin(1280, 720), (490, 360));
    }

    #[test]
    fn test_distance_label() {
        assert_eq!(distance_label(Some(240.83)).as_deref(), Some("Distance: 241 px"));
        assert_eq!(distance_label(None), None);
    }
}
