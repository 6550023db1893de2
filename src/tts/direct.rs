//! Direct speech: the engine blocks the caller until it is done

use super::{DirectEngine, ProviderSettings, SettingsTracker, SpeechBackend};
use crate::error::TtsResult;
use std::sync::atomic::{AtomicBool, Ordering};

/// Backend for engines that speak on the caller's thread
pub struct DirectBackend<E: DirectEngine> {
    engine: E,
    settings: SettingsTracker,
    closed: AtomicBool,
}

impl<E: DirectEngine> DirectBackend<E> {
    pub fn new(engine: E, settings: ProviderSettings) -> Self {
        Self {
            engine,
            settings: SettingsTracker::new(settings),
            closed: AtomicBool::new(false),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: DirectEngine> SpeechBackend for DirectBackend<E> {
    fn provider(&self) -> &'static str {
        self.engine.provider()
    }

    fn display_name(&self) -> &'static str {
        self.engine.display_name()
    }

    fn say(&self, text: &str, interrupt: bool) -> TtsResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.engine.say(text, interrupt)
    }

    fn say_list(&self, texts: &[String], interrupt: bool) -> TtsResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.engine.say_list(texts, interrupt)
    }

    fn insert_pause(&self, ms: u64) {
        self.engine.insert_pause(ms);
    }

    fn voices(&self) -> Option<Vec<String>> {
        self.engine.voices()
    }

    fn is_speaking(&self) -> Option<bool> {
        self.engine.is_speaking()
    }

    fn refresh_settings(&self) {
        self.settings.refresh(&self.engine);
    }

    fn stop(&self) {
        self.engine.stop();
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop();
        self.engine.close();
    }
}
