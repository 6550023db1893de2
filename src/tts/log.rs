//! Log-only backend, always available

use super::{DirectEngine, SpeechEngine};
use crate::error::TtsResult;
use tracing::info;

pub const PROVIDER: &str = "log";

#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyEngine;

impl SpeechEngine for LogOnlyEngine {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn display_name(&self) -> &'static str {
        "Log"
    }

    fn available(&self) -> bool {
        true
    }
}

impl DirectEngine for LogOnlyEngine {
    fn say(&self, text: &str, interrupt: bool) -> TtsResult<()> {
        info!("📝 say(interrupt={}): {:?}", interrupt, text);
        Ok(())
    }

    fn insert_pause(&self, ms: u64) {
        info!("📝 pause({}ms)", ms);
    }
}
