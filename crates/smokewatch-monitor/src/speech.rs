//! Spoken alerts through a system speech engine.
//!
//! The engine runs as a child process; `speak` resolves once the process
//! exits, which for the supported engines is when playback has finished.

use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};

pub type SpeechResult<T> = MonitorResult<T>;

/// Speech capability used by the alert gate.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Speak `text`, returning when playback ends.
    async fn speak(&self, text: &str) -> SpeechResult<()>;

    /// Engine name for logs and metrics.
    fn name(&self) -> &str;
}

/// Supported command-line speech engines, in auto-detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEngine {
    EspeakNg,
    Espeak,
    SpdSay,
    Say,
}

impl SpeechEngine {
    pub const ALL: [SpeechEngine; 4] = [
        SpeechEngine::EspeakNg,
        SpeechEngine::Espeak,
        SpeechEngine::SpdSay,
        SpeechEngine::Say,
    ];

    pub fn binary(&self) -> &'static str {
        match self {
            SpeechEngine::EspeakNg => "espeak-ng",
            SpeechEngine::Espeak => "espeak",
            SpeechEngine::SpdSay => "spd-say",
            SpeechEngine::Say => "say",
        }
    }

    /// Command-line arguments speaking `text` at `rate` words per minute.
    pub fn args(&self, text: &str, rate: u32) -> Vec<String> {
        match self {
            SpeechEngine::EspeakNg | SpeechEngine::Espeak => {
                vec!["-s".to_string(), rate.to_string(), text.to_string()]
            }
            // spd-say returns immediately unless asked to wait
            SpeechEngine::SpdSay => vec!["-w".to_string(), text.to_string()],
            SpeechEngine::Say => vec!["-r".to_string(), rate.to_string(), text.to_string()],
        }
    }
}

impl FromStr for SpeechEngine {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpeechEngine::ALL
            .into_iter()
            .find(|engine| engine.binary().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MonitorError::config(format!("unknown speech engine: {s}")))
    }
}

/// Speaker backed by a speech engine binary on `PATH`.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    engine: SpeechEngine,
    program: PathBuf,
    rate: u32,
}

impl CommandSpeaker {
    pub fn new(engine: SpeechEngine, program: PathBuf, rate: u32) -> Self {
        Self {
            engine,
            program,
            rate,
        }
    }

    /// Locate `preferred`, or the first available engine when `None`.
    pub fn detect(preferred: Option<&str>, rate: u32) -> MonitorResult<Self> {
        let candidates = match preferred {
            Some(name) => vec![name.parse::<SpeechEngine>()?],
            None => SpeechEngine::ALL.to_vec(),
        };

        for engine in &candidates {
            if let Ok(program) = which::which(engine.binary()) {
                info!("Using speech engine {} at {}", engine.binary(), program.display());
                return Ok(Self::new(*engine, program, rate));
            }
            debug!("Speech engine {} not on PATH", engine.binary());
        }

        let tried: Vec<&str> = candidates.iter().map(|e| e.binary()).collect();
        Err(MonitorError::SpeechEngineNotFound(tried.join(", ")))
    }

    pub fn engine(&self) -> SpeechEngine {
        self.engine
    }
}

#[async_trait]
impl Speaker for CommandSpeaker {
    async fn speak(&self, text: &str) -> SpeechResult<()> {
        let output = Command::new(&self.program)
            .args(self.engine.args(text, self.rate))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MonitorError::speech_failed(format!(
                "{} exited with {}: {}",
                self.engine.binary(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        self.engine.binary()
    }
}

/// Speaker used when no engine is installed: the alert only reaches the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSpeaker;

#[async_trait]
impl Speaker for LogSpeaker {
    async fn speak(&self, text: &str) -> SpeechResult<()> {
        warn!(alert = %text, "No speech engine available, alert not spoken");
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Build the speaker for `config`, falling back to [`LogSpeaker`] when
/// auto-detection finds nothing.
///
/// An explicitly configured engine that cannot be found is an error.
pub fn speaker_from_config(config: &MonitorConfig) -> MonitorResult<Arc<dyn Speaker>> {
    match CommandSpeaker::detect(config.speech_engine.as_deref(), config.speech_rate) {
        Ok(speaker) => Ok(Arc::new(speaker)),
        Err(MonitorError::SpeechEngineNotFound(tried)) if config.speech_engine.is_none() => {
            warn!("No speech engine found (tried: {}), alerts will only be logged", tried);
            Ok(Arc::new(LogSpeaker))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_parse() {
        assert_eq!("espeak-ng".parse::<SpeechEngine>().unwrap(), SpeechEngine::EspeakNg);
        assert_eq!(" SAY ".parse::<SpeechEngine>().unwrap(), SpeechEngine::Say);
        assert!(matches!(
            "festival".parse::<SpeechEngine>(),
            Err(MonitorError::Config(_))
        ));
    }

    #[test]
    fn test_engine_args() {
        assert_eq!(
            SpeechEngine::Espeak.args("hi", 150),
            vec!["-s", "150", "hi"]
        );
        assert_eq!(SpeechEngine::SpdSay.args("hi", 150), vec!["-w", "hi"]);
        assert_eq!(SpeechEngine::Say.args("hi", 180), vec!["-r", "180", "hi"]);
    }

    #[test]
    fn test_log_speaker_succeeds() {
        tokio_test::block_on(LogSpeaker.speak("Smoking detected")).unwrap();
        assert_eq!(LogSpeaker.name(), "log");
    }

    #[tokio::test]
    async fn test_failing_command_reports_error() {
        let Ok(program) = which::which("false") else {
            return;
        };
        let speaker = CommandSpeaker::new(SpeechEngine::Say, program, 150);
        let err = speaker.speak("hello").await.unwrap_err();
        assert!(matches!(err, MonitorError::SpeechFailed(_)));
    }
}
