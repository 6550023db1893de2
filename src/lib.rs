//! TTS Service Library
//!
//! Queued text-to-speech with pluggable synthesis engines and wav playback.

pub mod audio;
pub mod config;
pub mod error;
pub mod host;
pub mod tts;

pub use error::{TtsError, TtsResult};
