//! Monitor configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{MonitorError, MonitorResult};

/// Monitor configuration.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorConfig {
    /// Camera device index
    pub camera_index: i32,
    /// Nose to index fingertip distance (pixels) below which a frame counts as smoking
    pub proximity_threshold_px: f32,
    /// Minimum time between two alert starts
    pub cooldown: Duration,
    /// Phrase spoken on alert
    pub alert_text: String,
    /// Speech rate in words per minute
    pub speech_rate: u32,
    /// Speech engine binary name; auto-detected when unset
    pub speech_engine: Option<String>,
    /// Minimum hand presence score
    pub hand_min_confidence: f32,
    /// Maximum hands tracked per frame
    pub max_hands: usize,
    /// Flip frames horizontally for a mirror view
    pub mirror: bool,
    /// Show the preview window (headless otherwise)
    pub show_window: bool,
    /// Preview window title
    pub window_name: String,
    /// Directory holding the ONNX/YuNet model files
    pub model_dir: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            proximity_threshold_px: 100.0,
            cooldown: Duration::from_secs(5),
            alert_text: "Smoking detected. Please stop smoking.".to_string(),
            speech_rate: 150,
            speech_engine: None,
            hand_min_confidence: 0.8,
            max_hands: 2,
            mirror: true,
            show_window: true,
            window_name: "Smoking Detection System".to_string(),
            model_dir: PathBuf::from("./models"),
        }
    }
}

impl MonitorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Unset or unparsable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            camera_index: parsed(parse("SMOKEWATCH_CAMERA"), defaults.camera_index),
            proximity_threshold_px: parsed(
                parse("SMOKEWATCH_PROXIMITY_PX"),
                defaults.proximity_threshold_px,
            ),
            cooldown: parse("SMOKEWATCH_COOLDOWN_SECS")
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cooldown),
            alert_text: parse("SMOKEWATCH_ALERT_TEXT").unwrap_or(defaults.alert_text),
            speech_rate: parsed(parse("SMOKEWATCH_SPEECH_RATE"), defaults.speech_rate),
            speech_engine: parse("SMOKEWATCH_SPEECH_ENGINE").map(|s| s.trim().to_string()),
            hand_min_confidence: parsed(
                parse("SMOKEWATCH_HAND_CONFIDENCE"),
                defaults.hand_min_confidence,
            ),
            max_hands: parsed(parse("SMOKEWATCH_MAX_HANDS"), defaults.max_hands),
            mirror: parse("SMOKEWATCH_MIRROR")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.mirror),
            show_window: parse("SMOKEWATCH_SHOW_WINDOW")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.show_window),
            window_name: parse("SMOKEWATCH_WINDOW").unwrap_or(defaults.window_name),
            model_dir: parse("SMOKEWATCH_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
        }
    }

    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> MonitorResult<()> {
        if !self.proximity_threshold_px.is_finite() || self.proximity_threshold_px <= 0.0 {
            return Err(MonitorError::config(format!(
                "proximity threshold must be positive, got {}",
                self.proximity_threshold_px
            )));
        }
        if self.cooldown.is_zero() {
            return Err(MonitorError::config("cooldown must be at least one second"));
        }
        if self.max_hands == 0 {
            return Err(MonitorError::config("max_hands must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.hand_min_confidence) {
            return Err(MonitorError::config(format!(
                "hand confidence must be within [0, 1], got {}",
                self.hand_min_confidence
            )));
        }
        if self.alert_text.trim().is_empty() {
            return Err(MonitorError::config("alert text is empty"));
        }
        Ok(())
    }
}

fn parsed<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::from_lookup(lookup(&[]));
        assert_eq!(config.camera_index, 0);
        assert_eq!(config.proximity_threshold_px, 100.0);
        assert_eq!(config.cooldown, Duration::from_secs(5));
        assert_eq!(config.window_name, "Smoking Detection System");
        assert!(config.mirror);
        assert!(config.speech_engine.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_overrides() {
        let config = MonitorConfig::from_lookup(lookup(&[
            ("SMOKEWATCH_CAMERA", "2"),
            ("SMOKEWATCH_PROXIMITY_PX", "80.5"),
            ("SMOKEWATCH_COOLDOWN_SECS", "10"),
            ("SMOKEWATCH_SPEECH_ENGINE", " espeak "),
            ("SMOKEWATCH_MIRROR", "off"),
            ("SMOKEWATCH_SHOW_WINDOW", "0"),
            ("SMOKEWATCH_MODEL_DIR", "/opt/models"),
        ]));
        assert_eq!(config.camera_index, 2);
        assert_eq!(config.proximity_threshold_px, 80.5);
        assert_eq!(config.cooldown, Duration::from_secs(10));
        assert_eq!(config.speech_engine.as_deref(), Some("espeak"));
        assert!(!config.mirror);
        assert!(!config.show_window);
        assert_eq!(config.model_dir, PathBuf::from("/opt/models"));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = MonitorConfig::from_lookup(lookup(&[
            ("SMOKEWATCH_CAMERA", "front"),
            ("SMOKEWATCH_COOLDOWN_SECS", "-3"),
            ("SMOKEWATCH_MIRROR", "maybe"),
            ("SMOKEWATCH_ALERT_TEXT", "   "),
        ]));
        assert_eq!(config.camera_index, 0);
        assert_eq!(config.cooldown, Duration::from_secs(5));
        assert!(config.mirror);
        assert_eq!(config.alert_text, MonitorConfig::default().alert_text);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MonitorConfig {
            proximity_threshold_px: 0.0,
            ..MonitorConfig::default()
        };
        assert!(matches!(config.validate(), Err(MonitorError::Config(_))));

        config.proximity_threshold_px = 100.0;
        config.cooldown = Duration::ZERO;
        assert!(config.validate().is_err());

        config.cooldown = Duration::from_secs(5);
        config.max_hands = 0;
        assert!(config.validate().is_err());
    }
}
