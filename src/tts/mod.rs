//! TTS (Text-to-Speech) Module
//!
//! Provides a unified interface for multiple TTS backends.
//!
//! Engines implement one of three contracts and are wrapped accordingly:
//! - [`DirectEngine`] speaks on the caller's thread ([`DirectBackend`])
//! - [`ThreadedEngine`] speaks one utterance at a time on a worker thread
//!   ([`ThreadedBackend`])
//! - [`WavEngine`] renders a wav for the [`WavPlayer`] or speaks by itself
//!   ([`SimpleBackend`])
//!
//! The wrappers own the stop/close sequence; engines only supply hooks.

use crate::audio::{PlayerOptions, WavPlayer};
use crate::config::SettingsStore;
use crate::error::{TtsError, TtsResult};
use crate::host::Host;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub mod direct;
pub mod espeak;
pub mod log;
pub mod piper;
pub mod simple;
pub mod threaded;

pub use direct::DirectBackend;
pub use simple::SimpleBackend;
pub use threaded::ThreadedBackend;

/// Pause inserted between the items of a `say_list`
pub const DEFAULT_PAUSE_MS: u64 = 500;

/// Default value of an engine-specific setting
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtraDefault {
    Bool(bool),
    Int(i64),
    Str(&'static str),
}

impl From<ExtraDefault> for Value {
    fn from(default: ExtraDefault) -> Self {
        match default {
            ExtraDefault::Bool(b) => Value::Bool(b),
            ExtraDefault::Int(i) => Value::from(i),
            ExtraDefault::Str(s) => Value::from(s),
        }
    }
}

/// Engine-specific setting stored as `<key>.<provider>`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extra {
    pub key: &'static str,
    pub default: ExtraDefault,
}

/// What every speech engine provides, whichever way it speaks
pub trait SpeechEngine: Send + Sync + 'static {
    /// Settings key suffix and backend id
    fn provider(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Engine-specific settings tracked for changes
    fn extras(&self) -> &'static [Extra] {
        &[]
    }

    /// Known to misbehave; hidden while `disable_broken_backends` is set
    fn broken(&self) -> bool {
        false
    }

    /// Whether the engine can speak in the current environment
    fn available(&self) -> bool {
        false
    }

    fn voices(&self) -> Option<Vec<String>> {
        None
    }

    /// Called when the user changed voice or speed. Only changed values are `Some`.
    fn update(&self, _voice: Option<&str>, _speed: Option<i64>) {}

    /// Stop hook, run by the backend's stop sequence
    fn stop(&self) {}

    /// Close hook, run once by the backend's close sequence
    fn close(&self) {}
}

/// Engine that speaks synchronously on the caller's thread
pub trait DirectEngine: SpeechEngine {
    fn say(&self, text: &str, interrupt: bool) -> TtsResult<()>;

    /// Speak the first item, then each remaining item after a pause
    fn say_list(&self, texts: &[String], interrupt: bool) -> TtsResult<()> {
        let Some((first, rest)) = texts.split_first() else {
            return Ok(());
        };
        self.say(first, interrupt)?;
        for text in rest {
            self.insert_pause(DEFAULT_PAUSE_MS);
            self.say(text, false)?;
        }
        Ok(())
    }

    fn insert_pause(&self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }

    fn is_speaking(&self) -> Option<bool> {
        None
    }
}

/// Engine whose blocking `threaded_say` runs on a dedicated worker thread.
/// Interrupting an utterance is the job of the `stop` hook.
pub trait ThreadedEngine: SpeechEngine {
    fn threaded_say(&self, text: &str) -> TtsResult<()>;

    /// Engine-side speaking state, on top of the queue's own
    fn is_speaking(&self) -> bool {
        false
    }
}

/// How a [`WavEngine`] produces sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechMode {
    /// Render to a wav file and play it through the `WavPlayer`
    WavOut,
    /// The engine plays the speech itself
    EngineSpeak,
}

/// Engine driven by [`SimpleBackend`]
pub trait WavEngine: SpeechEngine {
    fn mode(&self) -> SpeechMode {
        SpeechMode::WavOut
    }

    /// Render `text` to `out_file`. Required in `WavOut` mode.
    fn run_command(&self, _text: &str, _out_file: &Path) -> TtsResult<()> {
        Err(TtsError::NotImplemented("run_command"))
    }

    /// Speak `text` directly. Required in `EngineSpeak` mode.
    fn run_command_and_speak(&self, _text: &str) -> TtsResult<()> {
        Err(TtsError::NotImplemented("run_command_and_speak"))
    }
}

/// The backend surface used by the service
pub trait SpeechBackend: Send + Sync {
    fn provider(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Speak `text`; with `interrupt`, drop everything pending or playing first
    fn say(&self, text: &str, interrupt: bool) -> TtsResult<()>;

    fn say_list(&self, texts: &[String], interrupt: bool) -> TtsResult<()>;

    fn insert_pause(&self, ms: u64);

    fn voices(&self) -> Option<Vec<String>>;

    /// `None` when the backend cannot tell
    fn is_speaking(&self) -> Option<bool>;

    /// Re-read user settings and notify the engine of changes
    fn refresh_settings(&self);

    fn set_player(&self, _preferred: Option<&str>) {}

    fn set_speed(&self, _speed: i32) {}

    fn stop(&self);

    fn close(&self);
}

/// Availability including the broken-backend policy
pub fn is_available(engine: &dyn SpeechEngine, settings: &dyn SettingsStore) -> bool {
    if engine.broken() && settings.get_bool("disable_broken_backends", true) {
        return false;
    }
    engine.available()
}

/// A provider's view of the settings store
#[derive(Clone)]
pub struct ProviderSettings {
    store: Arc<dyn SettingsStore>,
    provider: &'static str,
}

impl ProviderSettings {
    pub fn new(store: Arc<dyn SettingsStore>, provider: &'static str) -> Self {
        Self { store, provider }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn store(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    fn key(&self, name: &str) -> String {
        format!("{}.{}", name, self.provider)
    }

    /// User voice name, "" when unset
    pub fn voice(&self) -> String {
        self.store.get_string(&self.key("voice"), "")
    }

    /// User speed, 0 when unset
    pub fn speed(&self) -> i64 {
        self.store.get_int(&self.key("speed"), 0)
    }

    pub fn extra(&self, key: &str, default: ExtraDefault) -> Value {
        match self.store.get(&self.key(key)) {
            Some(Value::Null) | None => default.into(),
            Some(value) => value,
        }
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("provider", &self.provider)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    voice: String,
    speed: i64,
    extras: HashMap<&'static str, Value>,
}

/// What a settings refresh found changed. Unchanged values are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChange {
    pub voice: Option<String>,
    pub speed: Option<i64>,
    pub extras: bool,
}

/// Last-seen voice, speed, and extras of one backend
#[derive(Debug)]
pub struct SettingsTracker {
    settings: ProviderSettings,
    last: Mutex<Option<Snapshot>>,
}

impl SettingsTracker {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            last: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Re-read settings and call `engine.update` if anything changed since the
    /// last read. The first read only records a baseline and returns `None`.
    pub fn refresh(&self, engine: &dyn SpeechEngine) -> Option<SettingsChange> {
        let fresh = Snapshot {
            voice: self.settings.voice(),
            speed: self.settings.speed(),
            extras: engine
                .extras()
                .iter()
                .map(|e| (e.key, self.settings.extra(e.key, e.default)))
                .collect(),
        };

        let previous = self.last.lock().ok()?.replace(fresh.clone())?;

        let change = SettingsChange {
            voice: (fresh.voice != previous.voice).then_some(fresh.voice),
            speed: (fresh.speed != previous.speed).then_some(fresh.speed),
            extras: fresh.extras != previous.extras,
        };
        if change.voice.is_none() && change.speed.is_none() && !change.extras {
            return None;
        }

        info!(
            "⚙️ {} settings changed (voice: {:?}, speed: {:?}, extras: {})",
            self.settings.provider, change.voice, change.speed, change.extras
        );
        engine.update(change.voice.as_deref(), change.speed);
        Some(change)
    }

    /// Speed from the last refresh, if any
    pub fn speed(&self) -> Option<i64> {
        self.last
            .lock()
            .ok()
            .and_then(|last| last.as_ref().map(|s| s.speed))
    }

    pub fn voice(&self) -> Option<String> {
        self.last
            .lock()
            .ok()
            .and_then(|last| last.as_ref().map(|s| s.voice.clone()))
    }
}

/// Known backends, in `auto` preference order
pub const BACKENDS: &[&str] = &["piper", "espeak", "log"];

/// Everything needed to build a backend
#[derive(Clone)]
pub struct BackendContext {
    pub settings: Arc<dyn SettingsStore>,
    pub host: Host,
    /// Parent of the per-provider wav directories
    pub audio_dir: PathBuf,
    pub player: Option<String>,
    pub advanced: bool,
}

impl BackendContext {
    fn provider_settings(&self, provider: &'static str) -> ProviderSettings {
        ProviderSettings::new(self.settings.clone(), provider)
    }

    fn wav_player(&self, provider: &str) -> WavPlayer {
        let options = PlayerOptions::new(
            self.host.sound.clone(),
            self.host.abort.clone(),
            self.audio_dir.join(provider),
        )
        .with_preferred(self.player.as_deref())
        .with_advanced(self.advanced);
        WavPlayer::new(options)
    }
}

/// Build a backend by name if its engine is available
fn try_create(name: &str, ctx: &BackendContext) -> TtsResult<Option<Arc<dyn SpeechBackend>>> {
    let backend: Arc<dyn SpeechBackend> = match name {
        "piper" => {
            let engine = piper::PiperEngine::new(ctx.provider_settings(piper::PROVIDER));
            if !is_available(&engine, ctx.settings.as_ref()) {
                return Ok(None);
            }
            let player = ctx.wav_player(piper::PROVIDER);
            Arc::new(SimpleBackend::new(
                engine,
                ctx.provider_settings(piper::PROVIDER),
                player,
                ctx.host.abort.clone(),
            )?)
        }
        "espeak" | "system" => {
            let engine = espeak::EspeakEngine::new(ctx.provider_settings(espeak::PROVIDER));
            if !is_available(&engine, ctx.settings.as_ref()) {
                return Ok(None);
            }
            let player = ctx.wav_player(espeak::PROVIDER);
            Arc::new(SimpleBackend::new(
                engine,
                ctx.provider_settings(espeak::PROVIDER),
                player,
                ctx.host.abort.clone(),
            )?)
        }
        "log" => Arc::new(DirectBackend::new(
            log::LogOnlyEngine,
            ctx.provider_settings(log::PROVIDER),
        )),
        _ => return Ok(None),
    };
    Ok(Some(backend))
}

/// Factory to create the configured TTS backend.
///
/// `auto`, unknown names, and unavailable backends resolve to the first
/// available entry of [`BACKENDS`]; the log backend is always available.
pub fn create_backend(name: &str, ctx: &BackendContext) -> TtsResult<Arc<dyn SpeechBackend>> {
    info!("🛠️ Creating TTS backend: {}", name);

    if name != "auto" {
        if let Some(backend) = try_create(name, ctx)? {
            info!("✅ TTS backend '{}' initialized", backend.display_name());
            return Ok(backend);
        }
        warn!("  - Backend '{}' unknown or unavailable, falling back to auto", name);
    }

    for candidate in BACKENDS {
        if let Some(backend) = try_create(candidate, ctx)? {
            info!("✅ TTS backend '{}' initialized", backend.display_name());
            return Ok(backend);
        }
    }
    Err(TtsError::ProcessUnavailable("no TTS backend available".into()))
}
