//! Capability traits for the perception loop.
//!
//! These traits give the monitor a uniform interface over the camera,
//! the landmark models, the overlay and the preview window, so the loop
//! can be driven by OpenCV in production and by fakes in tests.
//! Frame types are generic: the OpenCV implementations use `Mat`.

use smokewatch_models::{FaceLandmarks, FrameAnnotations, Hand};

use crate::error::VisionResult;

/// Source of video frames.
///
/// Implementations release the underlying device when dropped.
pub trait FrameSource: Send {
    type Frame;

    /// Grab the next frame.
    ///
    /// Returns `VisionError::CaptureFailed` when the device is exhausted or
    /// stopped delivering frames.
    fn read(&mut self) -> VisionResult<Self::Frame>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

/// Face mesh landmark provider.
pub trait FaceLandmarkProvider<F>: Send {
    /// Find face landmarks in a frame.
    ///
    /// # Returns
    /// One landmark set per detected face, best face first. An empty vector
    /// means no face was found.
    fn find(&mut self, frame: &F) -> VisionResult<Vec<FaceLandmarks>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Hand landmark provider.
pub trait HandLandmarkProvider<F>: Send {
    /// Find hands in a frame, best score first.
    fn find(&mut self, frame: &F) -> VisionResult<Vec<Hand>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Draws the monitor status onto a frame.
pub trait FrameRenderer<F>: Send {
    fn render(&mut self, frame: &mut F, annotations: &FrameAnnotations) -> VisionResult<()>;
}

/// Preview window and keyboard input.
pub trait Display<F>: Send {
    fn show(&mut self, frame: &F) -> VisionResult<()>;

    /// Poll for a pressed key without blocking for more than a frame.
    fn poll_key(&mut self) -> VisionResult<Option<char>>;

    /// Close all windows. Must be safe to call more than once.
    fn close(&mut self);
}
