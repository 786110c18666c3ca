//! End-to-end runs of the frame loop against fake capabilities.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use smokewatch_models::{FaceLandmarks, FrameAnnotations, Hand, MonitorStatus, Point2D, INDEX_FINGER_TIP};
use smokewatch_monitor::speech::SpeechResult;
use smokewatch_monitor::{Monitor, MonitorConfig, Pipeline, Speaker, TerminationReason};
use smokewatch_vision::{
    Display, FaceLandmarkProvider, FrameRenderer, FrameSource, HandLandmarkProvider, VisionError,
    VisionResult,
};
use tokio::sync::watch;

/// Frames are just their sequence number.
type Frame = u32;

struct ScriptedSource {
    remaining: u32,
    next: u32,
}

impl ScriptedSource {
    fn frames(count: u32) -> Self {
        Self {
            remaining: count,
            next: 0,
        }
    }
}

impl FrameSource for ScriptedSource {
    type Frame = Frame;

    fn read(&mut self) -> VisionResult<Frame> {
        if self.remaining == 0 {
            return Err(VisionError::capture_failed("end of script"));
        }
        self.remaining -= 1;
        self.next += 1;
        Ok(self.next)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

type FaceFn = Box<dyn FnMut(&Frame) -> VisionResult<Vec<FaceLandmarks>> + Send>;
type HandFn = Box<dyn FnMut(&Frame) -> VisionResult<Vec<Hand>> + Send>;

struct FakeFaces(FaceFn);

impl FaceLandmarkProvider<Frame> for FakeFaces {
    fn find(&mut self, frame: &Frame) -> VisionResult<Vec<FaceLandmarks>> {
        (self.0)(frame)
    }

    fn name(&self) -> &'static str {
        "fake_faces"
    }
}

struct FakeHands(HandFn);

impl HandLandmarkProvider<Frame> for FakeHands {
    fn find(&mut self, frame: &Frame) -> VisionResult<Vec<Hand>> {
        (self.0)(frame)
    }

    fn name(&self) -> &'static str {
        "fake_hands"
    }
}

#[derive(Clone, Default)]
struct RecordingRenderer {
    statuses: Arc<Mutex<Vec<MonitorStatus>>>,
}

impl FrameRenderer<Frame> for RecordingRenderer {
    fn render(&mut self, _frame: &mut Frame, annotations: &FrameAnnotations) -> VisionResult<()> {
        self.statuses.lock().unwrap().push(annotations.status);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct ScriptedDisplay {
    keys: Arc<Mutex<VecDeque<Option<char>>>>,
    shown: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedDisplay {
    fn with_keys(keys: &[Option<char>]) -> Self {
        let display = Self::default();
        display.keys.lock().unwrap().extend(keys.iter().copied());
        display
    }
}

impl Display<Frame> for ScriptedDisplay {
    fn show(&mut self, _frame: &Frame) -> VisionResult<()> {
        self.shown.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn poll_key(&mut self) -> VisionResult<Option<char>> {
        Ok(self.keys.lock().unwrap().pop_front().flatten())
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct CountingSpeaker {
    spoken: AtomicUsize,
}

#[async_trait]
impl Speaker for CountingSpeaker {
    async fn speak(&self, _text: &str) -> SpeechResult<()> {
        self.spoken.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

fn face_at(x: f32, y: f32) -> FaceLandmarks {
    FaceLandmarks::new(vec![Point2D::new(x, y - 10.0), Point2D::new(x, y)])
}

fn hand_with_tip(x: f32, y: f32) -> Hand {
    let mut joints = vec![Point2D::new(x, y + 150.0); 21];
    joints[INDEX_FINGER_TIP] = Point2D::new(x, y);
    Hand::new(joints)
}

fn no_faces() -> FakeFaces {
    FakeFaces(Box::new(|_| Ok(Vec::new())))
}

fn face_everywhere() -> FakeFaces {
    FakeFaces(Box::new(|_| Ok(vec![face_at(320.0, 240.0)])))
}

fn hand_at_mouth() -> FakeHands {
    FakeHands(Box::new(|_| Ok(vec![hand_with_tip(340.0, 250.0)])))
}

fn hand_far_away() -> FakeHands {
    FakeHands(Box::new(|_| Ok(vec![hand_with_tip(600.0, 450.0)])))
}

struct Harness {
    monitor: Monitor<Frame>,
    statuses: Arc<Mutex<Vec<MonitorStatus>>>,
    display: ScriptedDisplay,
    speaker: Arc<CountingSpeaker>,
    shutdown: watch::Sender<bool>,
}

fn harness(source: ScriptedSource, faces: FakeFaces, hands: FakeHands, display: ScriptedDisplay) -> Harness {
    let config = MonitorConfig {
        cooldown: Duration::from_secs(5),
        ..MonitorConfig::default()
    };
    let renderer = RecordingRenderer::default();
    let statuses = renderer.statuses.clone();
    let speaker = Arc::new(CountingSpeaker::default());
    let (shutdown, shutdown_rx) = watch::channel(false);

    let pipeline = Pipeline {
        source: Box::new(source),
        faces: Box::new(faces),
        hands: Box::new(hands),
        renderer: Box::new(renderer),
        display: Box::new(display.clone()),
    };

    Harness {
        monitor: Monitor::new(&config, pipeline, speaker.clone(), shutdown_rx),
        statuses,
        display,
        speaker,
        shutdown,
    }
}

#[tokio::test]
async fn test_no_face_never_alerts() {
    let mut h = harness(
        ScriptedSource::frames(20),
        no_faces(),
        hand_at_mouth(),
        ScriptedDisplay::default(),
    );

    let summary = h.monitor.run().await.unwrap();
    h.monitor.wait_for_alert().await;

    assert_eq!(summary.reason, TerminationReason::CaptureFailure);
    assert_eq!(summary.frames, 20);
    assert_eq!(summary.alerts, 0);
    assert_eq!(h.speaker.spoken.load(Ordering::SeqCst), 0);
    assert!(h
        .statuses
        .lock()
        .unwrap()
        .iter()
        .all(|s| *s == MonitorStatus::NoFace));
}

#[tokio::test]
async fn test_capture_exhaustion_closes_display() {
    let mut h = harness(
        ScriptedSource::frames(3),
        face_everywhere(),
        hand_far_away(),
        ScriptedDisplay::default(),
    );

    let summary = h.monitor.run().await.unwrap();

    assert_eq!(summary.reason, TerminationReason::CaptureFailure);
    assert_eq!(summary.frames, 3);
    assert_eq!(h.display.shown.load(Ordering::SeqCst), 3);
    assert_eq!(h.display.closed.load(Ordering::SeqCst), 1);
    assert_eq!(*h.statuses.lock().unwrap(), vec![MonitorStatus::Normal; 3]);
}

#[tokio::test]
async fn test_quit_key_stops_loop() {
    let mut h = harness(
        ScriptedSource::frames(100),
        face_everywhere(),
        hand_far_away(),
        ScriptedDisplay::with_keys(&[None, Some('x'), Some('q')]),
    );

    let summary = h.monitor.run().await.unwrap();

    assert_eq!(summary.reason, TerminationReason::QuitKey);
    assert_eq!(summary.frames, 3);
    assert_eq!(h.display.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_smoking_fires_single_alert_within_cooldown() {
    let mut h = harness(
        ScriptedSource::frames(30),
        face_everywhere(),
        hand_at_mouth(),
        ScriptedDisplay::default(),
    );

    let summary = h.monitor.run().await.unwrap();
    h.monitor.wait_for_alert().await;

    assert_eq!(summary.frames, 30);
    assert_eq!(summary.alerts, 1);
    assert_eq!(h.speaker.spoken.load(Ordering::SeqCst), 1);
    assert!(!h.monitor.alert_gate().is_in_progress());
    assert!(h
        .statuses
        .lock()
        .unwrap()
        .iter()
        .all(|s| s.is_smoking()));
}

#[tokio::test]
async fn test_shutdown_signal_interrupts() {
    let mut h = harness(
        ScriptedSource::frames(100),
        face_everywhere(),
        hand_far_away(),
        ScriptedDisplay::default(),
    );
    h.shutdown.send(true).unwrap();

    let summary = h.monitor.run().await.unwrap();

    assert_eq!(summary.reason, TerminationReason::Interrupted);
    assert_eq!(summary.frames, 0);
    assert_eq!(h.display.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_detector_errors_degrade_to_no_face() {
    let mut h = harness(
        ScriptedSource::frames(4),
        FakeFaces(Box::new(|frame| {
            if frame % 2 == 0 {
                Err(VisionError::detection_failed("model hiccup"))
            } else {
                Ok(vec![face_at(320.0, 240.0)])
            }
        })),
        FakeHands(Box::new(|_| Err(VisionError::detection_failed("hands offline")))),
        ScriptedDisplay::default(),
    );

    let summary = h.monitor.run().await.unwrap();

    assert_eq!(summary.reason, TerminationReason::CaptureFailure);
    assert_eq!(summary.alerts, 0);
    assert_eq!(
        *h.statuses.lock().unwrap(),
        vec![
            MonitorStatus::Normal,
            MonitorStatus::NoFace,
            MonitorStatus::Normal,
            MonitorStatus::NoFace,
        ]
    );
}
