//! Piper TTS backend calling a local binary

use super::{ProviderSettings, SpeechEngine, WavEngine};
use crate::error::{TtsError, TtsResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error, warn};

pub const PROVIDER: &str = "piper";
const BINARY: &str = "piper-tts";
const DEFAULT_VOICE: &str = "en_GB-cori-high";

#[derive(Debug)]
pub struct PiperEngine {
    settings: ProviderSettings,
    voices_dir: PathBuf,
}

impl PiperEngine {
    pub fn new(settings: ProviderSettings) -> Self {
        let voices_dir = dirs::data_dir()
            .unwrap_or_default()
            .join("tts-service/voices");
        Self {
            settings,
            voices_dir,
        }
    }

    pub fn with_voices_dir(mut self, voices_dir: impl Into<PathBuf>) -> Self {
        self.voices_dir = voices_dir.into();
        self
    }

    fn voice(&self) -> String {
        let voice = self.settings.voice();
        if voice.is_empty() {
            DEFAULT_VOICE.to_string()
        } else {
            voice
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.voices_dir.join(format!("{}.onnx", self.voice()))
    }
}

impl SpeechEngine for PiperEngine {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn display_name(&self) -> &'static str {
        "Piper"
    }

    fn available(&self) -> bool {
        let launched = Command::new(BINARY)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();
        if launched && !self.model_path().exists() {
            warn!("⚠️ Piper model not found at {}", self.model_path().display());
            return false;
        }
        launched
    }

    /// Installed `.onnx` models
    fn voices(&self) -> Option<Vec<String>> {
        let entries = std::fs::read_dir(&self.voices_dir).ok()?;
        let mut voices: Vec<String> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("onnx"))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        voices.sort();
        Some(voices)
    }
}

impl WavEngine for PiperEngine {
    fn run_command(&self, text: &str, out_file: &Path) -> TtsResult<()> {
        let model_path = self.model_path();
        if !model_path.exists() {
            return Err(TtsError::MissingResource(format!(
                "Piper model file missing: {}",
                model_path.display()
            )));
        }

        debug!("📢 Piper rendering to {:?}: '{}'", out_file, text);
        let mut child = Command::new(BINARY)
            .arg("-m")
            .arg(&model_path)
            .arg("-f")
            .arg(out_file)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                error!("❌ Failed to spawn {}: {}", BINARY, e);
                TtsError::ProcessUnavailable(format!("Failed to spawn {}: {}", BINARY, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
            stdin.flush()?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(TtsError::ProcessControl(format!(
                "Piper failed with status {}",
                status
            )));
        }

        if !out_file.exists() {
            return Err(TtsError::MissingResource(
                "Piper output file not created".into(),
            ));
        }
        Ok(())
    }
}
