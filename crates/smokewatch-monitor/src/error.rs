//! Monitor error types.

use thiserror::Error;

pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech failed: {0}")]
    SpeechFailed(String),

    #[error("No speech engine found (tried: {0})")]
    SpeechEngineNotFound(String),

    #[error("Vision error: {0}")]
    Vision(#[from] smokewatch_vision::VisionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn speech_failed(msg: impl Into<String>) -> Self {
        Self::SpeechFailed(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smokewatch_vision::VisionError;

    #[test]
    fn test_vision_error_converts() {
        let err: MonitorError = VisionError::capture_failed("unplugged").into();
        assert!(matches!(err, MonitorError::Vision(_)));
        assert!(err.to_string().contains("unplugged"));
    }
}
