//! The frame loop.
//!
//! Each iteration reads a frame, finds the face and hands, classifies the
//! frame, fires the alert gate on a positive verdict, draws the overlay and
//! shows the frame. The loop ends on capture failure, the `q` key or the
//! shutdown signal.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use smokewatch_models::{FaceLandmarks, FrameAnnotations, Hand, MonitorStatus};
use smokewatch_vision::{
    Display, FaceLandmarkProvider, FpsCounter, FrameRenderer, FrameSource, HandLandmarkProvider,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::alert::{AlertDecision, AlertGate, DetectionState};
use crate::classifier;
use crate::config::MonitorConfig;
use crate::error::MonitorResult;
use crate::metrics;
use crate::speech::Speaker;

/// Key that stops the monitor from the preview window.
pub const QUIT_KEY: char = 'q';

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The frame source stopped delivering frames.
    CaptureFailure,
    /// The quit key was pressed in the preview window.
    QuitKey,
    /// The shutdown signal was raised (Ctrl-C).
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub reason: TerminationReason,
    pub frames: u64,
    pub alerts: u64,
}

/// The capture, detection and presentation stages for frames of type `F`.
pub struct Pipeline<F> {
    pub source: Box<dyn FrameSource<Frame = F>>,
    pub faces: Box<dyn FaceLandmarkProvider<F>>,
    pub hands: Box<dyn HandLandmarkProvider<F>>,
    pub renderer: Box<dyn FrameRenderer<F>>,
    pub display: Box<dyn Display<F>>,
}

pub struct Monitor<F> {
    pipeline: Pipeline<F>,
    gate: AlertGate,
    fps: FpsCounter,
    shutdown: watch::Receiver<bool>,
    started: Instant,
}

impl<F> Monitor<F> {
    pub fn new(
        config: &MonitorConfig,
        pipeline: Pipeline<F>,
        speaker: Arc<dyn Speaker>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let state = DetectionState::new(config.cooldown, config.proximity_threshold_px);
        Self {
            pipeline,
            gate: AlertGate::new(state, speaker, config.alert_text.clone()),
            fps: FpsCounter::new(),
            shutdown,
            started: Instant::now(),
        }
    }

    /// Run until a termination condition is reached.
    ///
    /// Capture failure, the quit key and the shutdown signal all end the run
    /// normally; render and display errors are returned.
    pub async fn run(&mut self) -> MonitorResult<RunSummary> {
        info!(
            source = self.pipeline.source.name(),
            faces = self.pipeline.faces.name(),
            hands = self.pipeline.hands.name(),
            "Monitor started"
        );
        self.started = Instant::now();
        self.fps.reset();

        let mut frames = 0u64;
        let mut alerts = 0u64;

        let reason = loop {
            if *self.shutdown.borrow() {
                break TerminationReason::Interrupted;
            }

            let mut frame = match self.pipeline.source.read() {
                Ok(frame) => frame,
                Err(e) if e.is_capture_failure() => {
                    info!("Frame capture ended: {}", e);
                    break TerminationReason::CaptureFailure;
                }
                Err(e) => return Err(e.into()),
            };
            frames += 1;
            metrics::record_frame();

            let mut annotations = self.evaluate(&frame);
            if annotations.status.is_smoking() {
                metrics::record_detection();
                let now = self.started.elapsed();
                match self.gate.maybe_alert(now) {
                    AlertDecision::Fired => alerts += 1,
                    decision => debug!(?decision, "Alert suppressed"),
                }
            }
            annotations.fps = self.fps.tick();

            self.pipeline.renderer.render(&mut frame, &annotations)?;
            self.pipeline.display.show(&frame)?;
            drop(frame);

            if self.pipeline.display.poll_key()? == Some(QUIT_KEY) {
                break TerminationReason::QuitKey;
            }

            // Give spawned alert tasks a turn on single-threaded runtimes.
            tokio::task::yield_now().await;
        };

        self.pipeline.display.close();
        info!(?reason, frames, alerts, "Monitor stopped");

        Ok(RunSummary {
            reason,
            frames,
            alerts,
        })
    }

    /// Detect and classify one frame. Detector errors degrade to "nothing found".
    fn evaluate(&mut self, frame: &F) -> FrameAnnotations {
        let face = match self.pipeline.faces.find(frame) {
            Ok(faces) => faces.into_iter().next().unwrap_or_default(),
            Err(e) => {
                warn!(provider = self.pipeline.faces.name(), "Face detection failed: {}", e);
                FaceLandmarks::empty()
            }
        };
        let hands: Vec<Hand> = match self.pipeline.hands.find(frame) {
            Ok(hands) => hands,
            Err(e) => {
                warn!(provider = self.pipeline.hands.name(), "Hand detection failed: {}", e);
                Vec::new()
            }
        };

        let threshold = self.gate.state().proximity_threshold_px;
        let status = classifier::classify(&face, &hands, threshold);
        let nearest_distance = classifier::nearest_fingertip_distance(&face, &hands);
        if status == MonitorStatus::SmokingDetected {
            debug!(distance = ?nearest_distance, "Hand near mouth");
        }

        FrameAnnotations {
            status,
            nose: face.nose_tip(),
            hands,
            nearest_distance,
            fps: 0.0,
        }
    }

    pub fn alert_gate(&self) -> &AlertGate {
        &self.gate
    }

    /// Wait for an in-flight alert to finish playing.
    pub async fn wait_for_alert(&mut self) {
        self.gate.wait_idle().await;
    }

    /// Time since the run started.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}
