//! eSpeak NG engine, speaking by itself

use super::{Extra, ExtraDefault, ProviderSettings, SpeechEngine, SpeechMode, WavEngine};
use crate::error::{TtsError, TtsResult};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

pub const PROVIDER: &str = "espeak";
const BINARY: &str = "espeak-ng";
const POLL_INTERVAL: Duration = Duration::from_millis(10);

const EXTRAS: &[Extra] = &[Extra {
    key: "pitch",
    default: ExtraDefault::Int(50),
}];

#[derive(Debug)]
pub struct EspeakEngine {
    settings: ProviderSettings,
    process: Mutex<Option<Child>>,
}

impl EspeakEngine {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            process: Mutex::new(None),
        }
    }

    /// Arguments for speaking `text` with the current settings
    pub fn speak_args(&self, text: &str) -> Vec<String> {
        let mut args = Vec::new();

        let speed = self.settings.speed();
        if speed > 0 {
            args.push("-s".to_string());
            args.push(speed.to_string());
        }

        let voice = self.settings.voice();
        if !voice.is_empty() {
            args.push("-v".to_string());
            args.push(voice);
        }

        let pitch = self
            .settings
            .extra("pitch", ExtraDefault::Int(50))
            .as_i64()
            .unwrap_or(50);
        args.push("-p".to_string());
        args.push(pitch.clamp(0, 99).to_string());

        args.push(text.to_string());
        args
    }
}

/// Voice names from `espeak-ng --voices` output
fn parse_voices(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(3))
        .map(str::to_string)
        .collect()
}

impl SpeechEngine for EspeakEngine {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn display_name(&self) -> &'static str {
        "eSpeak NG"
    }

    fn extras(&self) -> &'static [Extra] {
        EXTRAS
    }

    fn available(&self) -> bool {
        Command::new(BINARY)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn voices(&self) -> Option<Vec<String>> {
        let output = Command::new(BINARY).arg("--voices").output().ok()?;
        Some(parse_voices(&String::from_utf8_lossy(&output.stdout)))
    }

    fn stop(&self) {
        let Ok(mut process) = self.process.lock() else {
            return;
        };
        if let Some(child) = process.as_mut() {
            if let Err(e) = child.kill() {
                debug!("Stopping {} failed: {}", BINARY, e);
            }
        }
    }

    fn close(&self) {
        self.stop();
        if let Ok(mut process) = self.process.lock() {
            if let Some(mut child) = process.take() {
                let _ = child.wait();
            }
        }
    }
}

impl WavEngine for EspeakEngine {
    fn mode(&self) -> SpeechMode {
        SpeechMode::EngineSpeak
    }

    fn run_command_and_speak(&self, text: &str) -> TtsResult<()> {
        debug!("System speaking: {}", text);
        let child = Command::new(BINARY)
            .args(self.speak_args(text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| TtsError::ProcessUnavailable(format!("{}: {}", BINARY, e)))?;
        *self.process.lock()? = Some(child);

        loop {
            let running = match self.process.lock()?.as_mut() {
                Some(child) => matches!(child.try_wait(), Ok(None)),
                None => false,
            };
            if !running {
                return Ok(());
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
