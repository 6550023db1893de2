//! Host capability surface
//!
//! The narrow set of host primitives the speech core depends on: playing a
//! short sound by path, optionally stopping it, sleeping, and checking whether
//! the host has requested an abort. Logging goes through `tracing`.

use crate::error::{TtsError, TtsResult};
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Slice used when a wait must also watch the abort token
const ABORT_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Host facility for playing short sound resources
pub trait SoundHost: Send + Sync {
    /// Start playing the sound at `path`. Does not wait for it to finish.
    fn play_sound(&self, path: &Path) -> TtsResult<()>;

    /// Whether `stop_sound` actually interrupts playback on this host
    fn can_stop_sound(&self) -> bool {
        false
    }

    /// Stop any sound started by `play_sound`
    fn stop_sound(&self) {}
}

/// Host without any audio output
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSound;

impl SoundHost for NoSound {
    fn play_sound(&self, path: &Path) -> TtsResult<()> {
        Err(TtsError::Audio(format!(
            "no audio output available to play {}",
            path.display()
        )))
    }
}

/// Manual-reset event: `wait` blocks until `set` or timeout
#[derive(Debug, Default)]
pub struct Event {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        if let Ok(mut flag) = self.flag.lock() {
            *flag = true;
            self.cond.notify_all();
        }
    }

    pub fn clear(&self) {
        if let Ok(mut flag) = self.flag.lock() {
            *flag = false;
        }
    }

    pub fn is_set(&self) -> bool {
        self.flag.lock().map(|flag| *flag).unwrap_or(false)
    }

    /// Wait up to `timeout`. Returns true if the event was set.
    pub fn wait(&self, timeout: Duration) -> bool {
        let Ok(guard) = self.flag.lock() else {
            return false;
        };
        match self.cond.wait_timeout_while(guard, timeout, |set| !*set) {
            Ok((flag, _)) => *flag,
            Err(_) => false,
        }
    }

    /// Wait up to `timeout`, returning early if the event is set or `abort` fires.
    /// Returns true if the wait was cut short.
    pub fn wait_or_abort(&self, timeout: Duration, abort: &AbortToken) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if abort.is_aborted() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return self.is_set();
            }
            if self.wait((deadline - now).min(ABORT_CHECK_INTERVAL)) {
                return true;
            }
        }
    }
}

/// Host abort signal, shared by everything that blocks on behalf of the host
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    event: Arc<Event>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Sticky: there is no way to clear it.
    pub fn abort(&self) {
        self.event.set();
    }

    pub fn is_aborted(&self) -> bool {
        self.event.is_set()
    }

    /// Sleep for `duration` unless abort is requested first.
    /// Returns false if the sleep was cut short by an abort.
    pub fn sleep(&self, duration: Duration) -> bool {
        !self.event.wait(duration)
    }
}

/// Everything the core needs from the host application
#[derive(Clone)]
pub struct Host {
    pub sound: Arc<dyn SoundHost>,
    pub abort: AbortToken,
}

impl Host {
    pub fn new(sound: Arc<dyn SoundHost>, abort: AbortToken) -> Self {
        Self { sound, abort }
    }

    /// Host with no audio output and a fresh abort token
    pub fn silent() -> Self {
        Self::new(Arc::new(NoSound), AbortToken::new())
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("can_stop_sound", &self.sound.can_stop_sound())
            .field("aborted", &self.abort.is_aborted())
            .finish()
    }
}
