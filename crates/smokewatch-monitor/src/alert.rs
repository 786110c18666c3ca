//! Rate-limited, non-overlapping spoken alerts.
//!
//! The gate is driven from the frame loop. A fired alert runs on its own
//! tokio task so the loop never waits on speech; the in-progress flag is
//! cleared by a guard owned by that task, whatever way the task ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::metrics;
use crate::speech::Speaker;

/// Alerting state for one monitor run.
#[derive(Debug, Clone)]
pub struct DetectionState {
    /// Offset from run start of the last alert, `None` before the first.
    pub last_alert_time: Option<Duration>,
    alert_in_progress: Arc<AtomicBool>,
    pub cooldown: Duration,
    pub proximity_threshold_px: f32,
}

impl DetectionState {
    pub fn new(cooldown: Duration, proximity_threshold_px: f32) -> Self {
        Self {
            last_alert_time: None,
            alert_in_progress: Arc::new(AtomicBool::new(false)),
            cooldown,
            proximity_threshold_px,
        }
    }

    pub fn alert_in_progress(&self) -> bool {
        self.alert_in_progress.load(Ordering::Acquire)
    }

    fn cooling_down(&self, now: Duration) -> bool {
        self.last_alert_time
            .is_some_and(|last| now.saturating_sub(last) <= self.cooldown)
    }
}

/// Outcome of [`AlertGate::maybe_alert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// An alert task was started.
    Fired,
    /// The previous alert started less than a cooldown ago.
    CoolingDown,
    /// The previous alert is still playing.
    InProgress,
}

/// Clears the in-progress flag when the alert task ends.
struct InProgressGuard(Arc<AtomicBool>);

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct AlertGate {
    state: DetectionState,
    speaker: Arc<dyn Speaker>,
    message: String,
    in_flight: Option<JoinHandle<()>>,
}

impl AlertGate {
    pub fn new(state: DetectionState, speaker: Arc<dyn Speaker>, message: impl Into<String>) -> Self {
        Self {
            state,
            speaker,
            message: message.into(),
            in_flight: None,
        }
    }

    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    pub fn is_in_progress(&self) -> bool {
        self.state.alert_in_progress()
    }

    /// Start an alert at `now` (offset from run start) unless rate limited.
    ///
    /// Must be called from within a tokio runtime.
    pub fn maybe_alert(&mut self, now: Duration) -> AlertDecision {
        if self.state.cooling_down(now) {
            return AlertDecision::CoolingDown;
        }
        if self.state.alert_in_progress.swap(true, Ordering::AcqRel) {
            return AlertDecision::InProgress;
        }

        self.state.last_alert_time = Some(now);
        let guard = InProgressGuard(Arc::clone(&self.state.alert_in_progress));
        let speaker = Arc::clone(&self.speaker);
        let message = self.message.clone();

        info!(at_secs = now.as_secs_f64(), engine = speaker.name(), "Smoking alert fired");
        metrics::record_alert(speaker.name());

        self.in_flight = Some(tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = speaker.speak(&message).await {
                warn!(engine = speaker.name(), "Alert playback failed: {}", e);
                metrics::record_alert_failure(speaker.name());
            }
        }));

        AlertDecision::Fired
    }

    /// Wait for the most recently fired alert to finish.
    pub async fn wait_idle(&mut self) {
        let Some(handle) = self.in_flight.take() else {
            return;
        };
        if let Err(e) = handle.await {
            warn!("Alert task ended abnormally: {}", e);
            metrics::record_alert_failure(self.speaker.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;
    use crate::speech::SpeechResult;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

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

    struct BlockingSpeaker {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl Speaker for BlockingSpeaker {
        async fn speak(&self, _text: &str) -> SpeechResult<()> {
            self.release.notified().await;
            Ok(())
        }

        fn name(&self) -> &str {
            "blocking"
        }
    }

    struct FailingSpeaker;

    #[async_trait]
    impl Speaker for FailingSpeaker {
        async fn speak(&self, _text: &str) -> SpeechResult<()> {
            Err(MonitorError::speech_failed("audio device busy"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingSpeaker;

    #[async_trait]
    impl Speaker for PanickingSpeaker {
        async fn speak(&self, _text: &str) -> SpeechResult<()> {
            panic!("speech engine crashed");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn gate(speaker: Arc<dyn Speaker>) -> AlertGate {
        AlertGate::new(
            DetectionState::new(Duration::from_secs(5), 100.0),
            speaker,
            "Smoking detected. Please stop smoking.",
        )
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[tokio::test]
    async fn test_cooldown_sequence() {
        let speaker = Arc::new(CountingSpeaker::default());
        let mut gate = gate(speaker.clone());

        assert_eq!(gate.maybe_alert(secs(0)), AlertDecision::Fired);
        gate.wait_idle().await;
        assert!(!gate.is_in_progress());

        assert_eq!(gate.maybe_alert(secs(3)), AlertDecision::CoolingDown);
        assert_eq!(gate.maybe_alert(secs(6)), AlertDecision::Fired);
        gate.wait_idle().await;

        assert_eq!(speaker.spoken.load(Ordering::SeqCst), 2);
        assert_eq!(gate.state().last_alert_time, Some(secs(6)));
    }

    #[tokio::test]
    async fn test_cooldown_boundary_is_exclusive() {
        let mut gate = gate(Arc::new(CountingSpeaker::default()));
        assert_eq!(gate.maybe_alert(secs(0)), AlertDecision::Fired);
        gate.wait_idle().await;
        assert_eq!(gate.maybe_alert(secs(5)), AlertDecision::CoolingDown);
        assert_eq!(
            gate.maybe_alert(secs(5) + Duration::from_millis(1)),
            AlertDecision::Fired
        );
    }

    #[tokio::test]
    async fn test_no_overlap_while_playing() {
        let release = Arc::new(Notify::new());
        let mut gate = gate(Arc::new(BlockingSpeaker {
            release: release.clone(),
        }));

        assert_eq!(gate.maybe_alert(secs(0)), AlertDecision::Fired);
        assert!(gate.is_in_progress());
        assert_eq!(gate.maybe_alert(secs(10)), AlertDecision::InProgress);
        assert_eq!(gate.state().last_alert_time, Some(secs(0)));

        release.notify_one();
        gate.wait_idle().await;
        assert!(!gate.is_in_progress());
        assert_eq!(gate.maybe_alert(secs(11)), AlertDecision::Fired);
    }

    #[tokio::test]
    async fn test_cooldown_counts_from_trigger_not_speech_end() {
        let release = Arc::new(Notify::new());
        let mut gate = gate(Arc::new(BlockingSpeaker {
            release: release.clone(),
        }));

        assert_eq!(gate.maybe_alert(secs(0)), AlertDecision::Fired);
        assert_eq!(gate.maybe_alert(secs(3)), AlertDecision::CoolingDown);

        // speech ends well after the trigger
        release.notify_one();
        gate.wait_idle().await;

        assert_eq!(gate.state().last_alert_time, Some(secs(0)));
        assert_eq!(
            gate.maybe_alert(secs(5) + Duration::from_millis(1)),
            AlertDecision::Fired
        );
    }

    #[tokio::test]
    async fn test_failed_speech_clears_flag() {
        let mut gate = gate(Arc::new(FailingSpeaker));
        assert_eq!(gate.maybe_alert(secs(0)), AlertDecision::Fired);
        gate.wait_idle().await;
        assert!(!gate.is_in_progress());
        assert_eq!(gate.maybe_alert(secs(6)), AlertDecision::Fired);
    }

    #[tokio::test]
    async fn test_panicking_speech_clears_flag() {
        let mut gate = gate(Arc::new(PanickingSpeaker));
        assert_eq!(gate.maybe_alert(secs(0)), AlertDecision::Fired);
        gate.wait_idle().await;
        assert!(!gate.is_in_progress());
    }

    #[tokio::test]
    async fn test_wait_idle_without_alert() {
        let mut gate = gate(Arc::new(CountingSpeaker::default()));
        gate.wait_idle().await;
        assert_eq!(gate.state().last_alert_time, None);
    }
}
