#![allow(dead_code)]

pub mod mock_sound;
pub mod mock_tts;

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tts_service::audio::commands::{CommandDescriptor, OUT_FILE, SPEED};
use tts_service::config::{Config, SharedConfig};
use tts_service::tts::ProviderSettings;

const SAMPLE_RATE: u32 = 8000;

/// Write a silent mono wav lasting `duration`
pub fn write_wav(path: &Path, duration: Duration) {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).unwrap();
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let samples = (duration.as_secs_f64() * f64::from(SAMPLE_RATE)) as u64;
    for _ in 0..samples {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Settings of the "mock" provider over a fresh in-memory config
pub fn settings() -> (SharedConfig, ProviderSettings) {
    let shared = SharedConfig::new(Config::default());
    let settings = ProviderSettings::new(Arc::new(shared.clone()), "mock");
    (shared, settings)
}

/// Plays for five seconds, stopped politely
pub const SLEEPER: CommandDescriptor = CommandDescriptor {
    id: "sleeper",
    name: "Sleeper",
    available: &["true"],
    play: &["sh", "-c", "sleep 5", OUT_FILE],
    speed: None,
    speed_multiplier: 1.0,
    kill: false,
};

/// Speed-capable player that has to be killed
pub const TEMPO: CommandDescriptor = CommandDescriptor {
    id: "tempo",
    name: "Tempo",
    available: &["true"],
    play: &["sh", "-c", "sleep 5", OUT_FILE],
    speed: Some(&[SPEED]),
    speed_multiplier: 0.01,
    kill: true,
};

/// Writes its speed arguments next to the wav instead of playing
pub const RECORDER: CommandDescriptor = CommandDescriptor {
    id: "recorder",
    name: "Recorder",
    available: &["true"],
    play: &["sh", "-c", "echo \"$@\" > \"$0.args\"", OUT_FILE],
    speed: Some(&[SPEED]),
    speed_multiplier: 0.01,
    kill: false,
};

pub const MISSING: CommandDescriptor = CommandDescriptor {
    id: "missing",
    name: "Missing",
    available: &["tts-service-test-no-such-player", "--version"],
    play: &["tts-service-test-no-such-player", OUT_FILE],
    speed: None,
    speed_multiplier: 1.0,
    kill: false,
};

pub static PLAYERS: &[CommandDescriptor] = &[MISSING, SLEEPER, TEMPO];
pub static RECORDING_PLAYERS: &[CommandDescriptor] = &[RECORDER];
pub static NO_PLAYERS: &[CommandDescriptor] = &[MISSING];
