//! Built-in playback through the host's sound facility
//!
//! No external process is involved: the host is asked to play the wav and the
//! handler waits out the clip's duration. Interrupting that wait needs the
//! host to support stopping sounds; without it `stop()` does nothing and the
//! wait runs to completion.

use super::wav::wav_duration;
use super::PlayerHandler;
use crate::error::{TtsError, TtsResult};
use crate::host::{AbortToken, Event, SoundHost};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

pub const BUILTIN_ID: &str = "builtin";

pub struct BuiltinHandler {
    sound: Arc<dyn SoundHost>,
    abort: AbortToken,
    out_dir: PathBuf,
    out_file: Mutex<PathBuf>,
    sequence: AtomicU64,
    playing: AtomicBool,
    closed: AtomicBool,
    done: Event,
}

impl BuiltinHandler {
    pub fn new(sound: Arc<dyn SoundHost>, abort: AbortToken, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            sound,
            abort,
            out_dir: out_dir.into(),
            out_file: Mutex::new(PathBuf::new()),
            sequence: AtomicU64::new(0),
            playing: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            done: Event::new(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn next_out_file(&self) -> PathBuf {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S%6f");
        self.out_dir.join(format!("speech{}-{}.wav", stamp, seq))
    }
}

/// Clears the playing flag however `play` exits
struct PlayingGuard<'a>(&'a AtomicBool);

impl Drop for PlayingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PlayerHandler for BuiltinHandler {
    fn player(&self) -> Option<&'static str> {
        Some(BUILTIN_ID)
    }

    fn out_file(&self) -> TtsResult<PathBuf> {
        if !self.out_dir.exists() {
            std::fs::create_dir_all(&self.out_dir)?;
            info!("✅ Created wav directory: {}", self.out_dir.display());
        }
        let path = self.next_out_file();
        *self.out_file.lock()? = path.clone();
        Ok(path)
    }

    fn play(&self) -> TtsResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TtsError::HandlerClosed);
        }

        let path = self.out_file.lock()?.clone();
        if !path.exists() {
            warn!("⚠️ Builtin play skipped - missing wav file: {:?}", path);
            return Ok(());
        }

        self.playing.store(true, Ordering::SeqCst);
        let _guard = PlayingGuard(&self.playing);

        self.done.clear();
        self.sound.play_sound(&path)?;
        let duration = wav_duration(&path)?;
        debug!(
            "🔊 Builtin playing {:?} for {:?}",
            path.file_name().unwrap_or_default(),
            duration
        );

        self.done.wait_or_abort(duration, &self.abort);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        if self.sound.can_stop_sound() {
            self.done.set();
            self.sound.stop_sound();
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);

        let entries = match std::fs::read_dir(&self.out_dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            if let Err(e) = std::fs::remove_file(entry.path()) {
                debug!("Could not remove {:?}: {}", entry.path(), e);
            }
        }
    }
}

impl std::fmt::Debug for BuiltinHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinHandler")
            .field("out_dir", &self.out_dir)
            .field("playing", &self.is_playing())
            .finish()
    }
}
