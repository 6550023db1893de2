//! Mock TTS Engines for Testing
//!
//! Record everything spoken so tests can check order and timing.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tts_service::host::Event;
use tts_service::tts::{SpeechEngine, SpeechMode, ThreadedEngine, WavEngine};
use tts_service::{TtsError, TtsResult};

/// Text the mocks refuse to speak
pub const FAIL_TEXT: &str = "fail";

/// Settings changes seen through `update`
pub type Update = (Option<String>, Option<i64>);

#[derive(Debug, Clone)]
pub struct Spoken {
    pub text: String,
    pub at: Instant,
}

/// Threaded engine recording each utterance.
///
/// With a hold, every utterance lasts that long unless the stop hook
/// cuts it short.
#[derive(Debug)]
pub struct MockTts {
    spoken: Mutex<Vec<Spoken>>,
    updates: Mutex<Vec<Update>>,
    stops: AtomicUsize,
    closes: AtomicUsize,
    hold: Duration,
    gate: Event,
}

impl MockTts {
    pub fn new() -> Self {
        Self::with_hold(Duration::ZERO)
    }

    pub fn with_hold(hold: Duration) -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            hold,
            gate: Event::new(),
        }
    }

    pub fn spoken(&self) -> Vec<Spoken> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.spoken().into_iter().map(|s| s.text).collect()
    }

    pub fn updates(&self) -> Vec<Update> {
        self.updates.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl Default for MockTts {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechEngine for MockTts {
    fn provider(&self) -> &'static str {
        "mock"
    }

    fn display_name(&self) -> &'static str {
        "Mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn update(&self, voice: Option<&str>, speed: Option<i64>) {
        self.updates
            .lock()
            .unwrap()
            .push((voice.map(str::to_string), speed));
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.gate.set();
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl ThreadedEngine for MockTts {
    fn threaded_say(&self, text: &str) -> TtsResult<()> {
        self.gate.clear();
        self.spoken.lock().unwrap().push(Spoken {
            text: text.to_string(),
            at: Instant::now(),
        });
        if text == FAIL_TEXT {
            return Err(TtsError::Audio("mock failure".into()));
        }
        if !self.hold.is_zero() {
            self.gate.wait(self.hold);
        }
        Ok(())
    }
}

/// Wav engine rendering silent clips, or speaking by itself in
/// `EngineSpeak` mode
#[derive(Debug)]
pub struct MockWavTts {
    mode: SpeechMode,
    clip: Duration,
    rendered: Mutex<Vec<String>>,
    updates: Mutex<Vec<Update>>,
    gate: Event,
}

impl MockWavTts {
    pub fn wav_out(clip: Duration) -> Self {
        Self::new(SpeechMode::WavOut, clip)
    }

    pub fn engine_speak(clip: Duration) -> Self {
        Self::new(SpeechMode::EngineSpeak, clip)
    }

    fn new(mode: SpeechMode, clip: Duration) -> Self {
        Self {
            mode,
            clip,
            rendered: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            gate: Event::new(),
        }
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<Update> {
        self.updates.lock().unwrap().clone()
    }
}

impl SpeechEngine for MockWavTts {
    fn provider(&self) -> &'static str {
        "mock"
    }

    fn display_name(&self) -> &'static str {
        "Mock Wav"
    }

    fn available(&self) -> bool {
        true
    }

    fn update(&self, voice: Option<&str>, speed: Option<i64>) {
        self.updates
            .lock()
            .unwrap()
            .push((voice.map(str::to_string), speed));
    }

    fn stop(&self) {
        self.gate.set();
    }
}

impl WavEngine for MockWavTts {
    fn mode(&self) -> SpeechMode {
        self.mode
    }

    fn run_command(&self, text: &str, out_file: &Path) -> TtsResult<()> {
        self.rendered.lock().unwrap().push(text.to_string());
        super::write_wav(out_file, self.clip);
        Ok(())
    }

    fn run_command_and_speak(&self, text: &str) -> TtsResult<()> {
        self.gate.clear();
        self.rendered.lock().unwrap().push(text.to_string());
        self.gate.wait(self.clip);
        Ok(())
    }
}

/// Wav engine relying on the trait defaults, so every utterance fails
#[derive(Debug, Default)]
pub struct BareWavTts;

impl SpeechEngine for BareWavTts {
    fn provider(&self) -> &'static str {
        "bare"
    }

    fn display_name(&self) -> &'static str {
        "Bare"
    }
}

impl WavEngine for BareWavTts {}
