//! Frame rate measurement for the overlay.

use std::time::{Duration, Instant};

/// Smoothing factor for the frame interval EMA.
const SMOOTHING: f64 = 0.1;

/// Exponentially smoothed frames-per-second counter.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    last_tick: Option<Instant>,
    avg_interval: Option<f64>,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            last_tick: None,
            avg_interval: None,
        }
    }

    /// Record a frame at the current instant and return the smoothed FPS.
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Record a frame at `now` and return the smoothed FPS.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        if let Some(last) = self.last_tick {
            let interval = now.saturating_duration_since(last).as_secs_f64();
            if interval > 0.0 {
                self.avg_interval = Some(match self.avg_interval {
                    Some(avg) => avg + SMOOTHING * (interval - avg),
                    None => interval,
                });
            }
        }
        self.last_tick = Some(now);
        self.fps()
    }

    /// Current smoothed FPS, 0.0 until two frames were seen.
    pub fn fps(&self) -> f64 {
        match self.avg_interval {
            Some(avg) if avg > 0.0 => 1.0 / avg,
            _ => 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.last_tick = None;
        self.avg_interval = None;
    }

    /// Average frame interval, if known.
    pub fn interval(&self) -> Option<Duration> {
        self.avg_interval.map(Duration::from_secs_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_reports_zero() {
        let mut fps = FpsCounter::new();
        assert_eq!(fps.tick_at(Instant::now()), 0.0);
    }

    #[test]
    fn test_steady_rate() {
        let mut fps = FpsCounter::new();
        let start = Instant::now();
        for i in 0..30 {
            fps.tick_at(start + Duration::from_millis(i * 33));
        }
        let rate = fps.fps();
        assert!((rate - 30.3).abs() < 0.5, "expected ~30 fps, got {}", rate);
    }

    #[test]
    fn test_smoothing_damps_single_spike() {
        let mut fps = FpsCounter::new();
        let start = Instant::now();
        let mut t = start;
        for _ in 0..20 {
            t += Duration::from_millis(40);
            fps.tick_at(t);
        }
        t += Duration::from_millis(400);
        let rate = fps.tick_at(t);
        assert!(rate > 10.0, "a single slow frame should not collapse fps: {}", rate);
    }

    #[test]
    fn test_reset() {
        let mut fps = FpsCounter::new();
        let start = Instant::now();
        fps.tick_at(start);
        fps.tick_at(start + Duration::from_millis(50));
        assert!(fps.fps() > 0.0);
        fps.reset();
        assert_eq!(fps.fps(), 0.0);
        assert!(fps.interval().is_none());
    }
}
