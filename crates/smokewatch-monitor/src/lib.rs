//! Smoking gesture monitor.
//!
//! This crate provides:
//! - The hand-to-mouth proximity classifier
//! - A rate-limited alert gate playing spoken warnings on a tokio task
//! - The frame loop driving capture, detection, overlay and display
//! - Environment configuration and tracing setup for the binaries

pub mod alert;
pub mod classifier;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod speech;

pub use alert::{AlertDecision, AlertGate, DetectionState};
pub use classifier::{classify, is_smoking, nearest_fingertip_distance};
pub use config::MonitorConfig;
pub use error::{MonitorError, MonitorResult};
pub use monitor::{Monitor, Pipeline, RunSummary, TerminationReason, QUIT_KEY};
pub use speech::{speaker_from_config, CommandSpeaker, LogSpeaker, Speaker, SpeechEngine};
