//! Backends for engines that render wav files or speak by themselves
//!
//! In `WavOut` mode each utterance is rendered to the player's output file and
//! played through the [`WavPlayer`]. In `EngineSpeak` mode the engine makes
//! the sound itself and the player is bypassed.

use super::{
    ProviderSettings, SpeechBackend, SpeechEngine, SpeechMode, ThreadedBackend, ThreadedEngine,
    WavEngine,
};
use crate::audio::WavPlayer;
use crate::error::TtsResult;
use crate::host::AbortToken;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Routes each utterance according to the engine's mode
pub struct ModeDispatch<E> {
    engine: E,
    player: Arc<WavPlayer>,
    mode: SpeechMode,
    engine_speaking: AtomicBool,
}

impl<E: WavEngine> ModeDispatch<E> {
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn mode(&self) -> SpeechMode {
        self.mode
    }
}

impl<E: WavEngine> SpeechEngine for ModeDispatch<E> {
    fn provider(&self) -> &'static str {
        self.engine.provider()
    }

    fn display_name(&self) -> &'static str {
        self.engine.display_name()
    }

    fn extras(&self) -> &'static [super::Extra] {
        self.engine.extras()
    }

    fn broken(&self) -> bool {
        self.engine.broken()
    }

    fn available(&self) -> bool {
        self.engine.available()
    }

    fn voices(&self) -> Option<Vec<String>> {
        self.engine.voices()
    }

    fn update(&self, voice: Option<&str>, speed: Option<i64>) {
        self.engine.update(voice, speed);
    }

    fn stop(&self) {
        self.player.stop();
        self.engine.stop();
    }

    fn close(&self) {
        self.engine.close();
        self.player.close();
    }
}

impl<E: WavEngine> ThreadedEngine for ModeDispatch<E> {
    fn threaded_say(&self, text: &str) -> TtsResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        match self.mode {
            SpeechMode::WavOut => {
                let out_file = self.player.out_file()?;
                self.engine.run_command(text, &out_file)?;
                self.player.play()
            }
            SpeechMode::EngineSpeak => {
                self.engine_speaking.store(true, Ordering::SeqCst);
                let result = self.engine.run_command_and_speak(text);
                self.engine_speaking.store(false, Ordering::SeqCst);
                result
            }
        }
    }

    fn is_speaking(&self) -> bool {
        self.engine_speaking.load(Ordering::SeqCst) || self.player.is_playing()
    }
}

/// Threaded backend for a [`WavEngine`], owning its [`WavPlayer`]
pub struct SimpleBackend<E: WavEngine> {
    inner: ThreadedBackend<ModeDispatch<E>>,
    player: Arc<WavPlayer>,
}

impl<E: WavEngine> SimpleBackend<E> {
    pub fn new(
        engine: E,
        settings: ProviderSettings,
        player: WavPlayer,
        abort: AbortToken,
    ) -> TtsResult<Self> {
        let mode = engine.mode();
        match mode {
            SpeechMode::WavOut => info!("🎛️ {} mode: WAVOUT", engine.provider()),
            SpeechMode::EngineSpeak => info!("🎛️ {} mode: ENGINESPEAK", engine.provider()),
        }

        let player = Arc::new(player);
        let dispatch = ModeDispatch {
            engine,
            player: player.clone(),
            mode,
            engine_speaking: AtomicBool::new(false),
        };
        Ok(Self {
            inner: ThreadedBackend::new(dispatch, settings, abort)?,
            player,
        })
    }

    pub fn engine(&self) -> &E {
        self.inner.engine().engine()
    }

    pub fn mode(&self) -> SpeechMode {
        self.inner.engine().mode()
    }

    pub fn player(&self) -> &WavPlayer {
        &self.player
    }

    pub fn say(&self, text: &str, interrupt: bool) {
        self.inner.say(text, interrupt);
    }

    pub fn say_list(&self, texts: &[String], interrupt: bool) {
        self.inner.say_list(texts, interrupt);
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.is_speaking()
    }

    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn close(&self) {
        self.inner.close();
    }
}

impl<E: WavEngine> SpeechBackend for SimpleBackend<E> {
    fn provider(&self) -> &'static str {
        self.inner.engine().provider()
    }

    fn display_name(&self) -> &'static str {
        self.inner.engine().display_name()
    }

    fn say(&self, text: &str, interrupt: bool) -> TtsResult<()> {
        self.inner.say(text, interrupt);
        Ok(())
    }

    fn say_list(&self, texts: &[String], interrupt: bool) -> TtsResult<()> {
        self.inner.say_list(texts, interrupt);
        Ok(())
    }

    fn insert_pause(&self, ms: u64) {
        self.inner.insert_pause(ms);
    }

    fn voices(&self) -> Option<Vec<String>> {
        self.inner.engine().voices()
    }

    fn is_speaking(&self) -> Option<bool> {
        Some(self.inner.is_speaking())
    }

    /// Also hands the speed to the player, on the first read and whenever the
    /// setting changes. A speed set directly on the player survives otherwise.
    fn refresh_settings(&self) {
        let settings = self.inner.settings();
        let baseline = settings.speed().is_none();
        let change = settings.refresh(self.inner.engine());
        let speed = if baseline {
            settings.speed()
        } else {
            change.and_then(|c| c.speed)
        };
        if let Some(speed) = speed {
            self.player.set_speed(speed as i32);
        }
    }

    fn set_player(&self, preferred: Option<&str>) {
        self.player.set_player(preferred);
    }

    fn set_speed(&self, speed: i32) {
        self.player.set_speed(speed);
    }

    fn stop(&self) {
        self.inner.stop();
    }

    fn close(&self) {
        self.inner.close();
    }
}
