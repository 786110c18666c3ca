#![deny(unreachable_patterns)]
//! Vision capabilities for the smokewatch monitor.
//!
//! This crate provides:
//! - Capability traits for frame sources, landmark providers, overlay and display
//! - OpenCV webcam capture with mirroring
//! - YuNet face boxes refined by a MediaPipe face mesh (ONNX Runtime)
//! - MediaPipe palm detection feeding rotated hand landmark crops (ONNX Runtime)
//! - Status overlay drawing and a HighGUI preview window
//!
//! Everything that touches OpenCV or ONNX Runtime sits behind the `opencv`
//! feature; the traits and geometry helpers build without it.

pub mod display;
pub mod error;
pub mod fps;
pub mod model_paths;
pub mod palm_detection;
pub mod providers;
pub mod roi;

#[cfg(feature = "opencv")]
pub mod capture;
#[cfg(feature = "opencv")]
pub mod face_mesh;
#[cfg(feature = "opencv")]
pub mod hand_landmarks;
#[cfg(feature = "opencv")]
pub mod overlay;
#[cfg(feature = "opencv")]
mod tensor;
#[cfg(feature = "opencv")]
pub mod yunet;

pub use display::HeadlessDisplay;
pub use error::{VisionError, VisionResult};
pub use fps::FpsCounter;
pub use model_paths::ModelPaths;
pub use providers::{
    Display, FaceLandmarkProvider, FrameRenderer, FrameSource, HandLandmarkProvider,
};
pub use roi::{Roi, RotatedRoi};

#[cfg(feature = "opencv")]
pub use opencv;

#[cfg(feature = "opencv")]
pub use capture::CameraSource;
#[cfg(feature = "opencv")]
pub use display::HighGuiDisplay;
#[cfg(feature = "opencv")]
pub use face_mesh::{FaceMeshDetector, OrtFaceMeshProvider};
#[cfg(feature = "opencv")]
pub use hand_landmarks::{HandLandmarkDetector, OrtHandProvider};
#[cfg(feature = "opencv")]
pub use overlay::OverlayRenderer;
#[cfg(feature = "opencv")]
pub use palm_detection::PalmDetector;
#[cfg(feature = "opencv")]
pub use yunet::YuNetDetector;
