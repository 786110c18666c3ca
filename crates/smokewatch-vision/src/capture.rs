//! Webcam capture via OpenCV.

use opencv::core::{self, Mat};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use tracing::{info, warn};

use crate::error::{VisionError, VisionResult};
use crate::providers::FrameSource;

/// Horizontal flip code for `core::flip`.
const FLIP_HORIZONTAL: i32 = 1;

/// OpenCV camera frame source.
///
/// The device is released when the source is dropped, including on error
/// paths out of the monitor loop.
pub struct CameraSource {
    capture: VideoCapture,
    device_index: i32,
    mirror: bool,
}

impl CameraSource {
    /// Open camera `device_index`.
    ///
    /// With `mirror` set, frames are flipped horizontally for a mirror view.
    pub fn open(device_index: i32, mirror: bool) -> VisionResult<Self> {
        let capture = VideoCapture::new(device_index, videoio::CAP_ANY)?;

        if !capture.is_opened()? {
            return Err(VisionError::CameraUnavailable(device_index));
        }

        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).unwrap_or(0.0);
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).unwrap_or(0.0);
        info!(
            "Opened camera {} at {}x{} (mirror: {})",
            device_index, width, height, mirror
        );

        Ok(Self {
            capture,
            device_index,
            mirror,
        })
    }

    pub fn device_index(&self) -> i32 {
        self.device_index
    }
}

impl FrameSource for CameraSource {
    type Frame = Mat;

    fn read(&mut self) -> VisionResult<Mat> {
        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .map_err(|e| VisionError::capture_failed(e.to_string()))?;

        if !grabbed || frame.empty() {
            return Err(VisionError::capture_failed(format!(
                "camera {} returned no frame",
                self.device_index
            )));
        }

        if !self.mirror {
            return Ok(frame);
        }

        let mut mirrored = Mat::default();
        core::flip(&frame, &mut mirrored, FLIP_HORIZONTAL)?;
        Ok(mirrored)
    }

    fn name(&self) -> &'static str {
        "opencv_camera"
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release camera {}: {}", self.device_index, e);
        } else {
            info!("Released camera {}", self.device_index);
        }
    }
}
