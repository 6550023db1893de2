//! TTS Service Error Types
//!
//! Centralized error handling for speech backends and playback handlers.

use thiserror::Error;

/// Central error type for the speech service
#[derive(Error, Debug)]
pub enum TtsError {
    /// A mandatory engine method was not provided
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Missing resource: {0}")]
    MissingResource(String),

    #[error("Player unavailable: {0}")]
    ProcessUnavailable(String),

    #[error("Process control failed: {0}")]
    ProcessControl(String),

    #[error("Playback handler is closed")]
    HandlerClosed,

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for speech service operations
pub type TtsResult<T> = Result<T, TtsError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for TtsError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        TtsError::Lock(err.to_string())
    }
}

impl From<hound::Error> for TtsError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => TtsError::Io(e),
            other => TtsError::Audio(other.to_string()),
        }
    }
}
