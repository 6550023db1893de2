//! External process playback
//!
//! Plays the wav through one of the registered command-line players. The
//! process runs for the length of the clip; `play()` polls it so that a
//! concurrent `stop()` or `close()` can take effect.

use super::commands::CommandDescriptor;
use super::PlayerHandler;
use crate::error::{TtsError, TtsResult};
use crate::host::AbortToken;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const OUT_FILE_NAME: &str = "speech.wav";

/// Launch a probe command; a launch failure means the player is missing.
/// The exit status is not consulted since some players exit non-zero for `--help`.
fn probe(descriptor: &CommandDescriptor) -> bool {
    let Some((program, args)) = descriptor.available.split_first() else {
        return false;
    };
    match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => true,
        Err(e) => {
            debug!("Player {} unavailable: {}", descriptor.id, e);
            false
        }
    }
}

/// Ask a process to exit (SIGTERM on Unix)
fn terminate(child: &mut Child) -> TtsResult<()> {
    #[cfg(unix)]
    {
        let status = Command::new("kill")
            .arg("-TERM")
            .arg(child.id().to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if !status.success() {
            return Err(TtsError::ProcessControl(format!(
                "kill -TERM {} exited with {}",
                child.id(),
                status
            )));
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        child.kill()?;
        Ok(())
    }
}

fn still_running(child: &mut Child) -> bool {
    matches!(child.try_wait(), Ok(None))
}

pub struct ExternalPlayerHandler {
    available_players: Vec<&'static CommandDescriptor>,
    has_advanced_player: bool,
    player: RwLock<Option<&'static CommandDescriptor>>,
    out_file: PathBuf,
    speed: AtomicI32,
    process: Mutex<Option<Child>>,
    active: AtomicBool,
    abort: AbortToken,
}

impl ExternalPlayerHandler {
    /// Probe `registry` and select a player
    pub fn new(
        registry: &'static [CommandDescriptor],
        out_dir: impl Into<PathBuf>,
        abort: AbortToken,
        preferred: Option<&str>,
        advanced: bool,
    ) -> Self {
        let available_players: Vec<_> = registry.iter().filter(|p| probe(p)).collect();
        let has_advanced_player = available_players.iter().any(|p| p.is_advanced());

        debug!(
            "Available external players: {:?}",
            available_players.iter().map(|p| p.id).collect::<Vec<_>>()
        );

        let handler = Self {
            available_players,
            has_advanced_player,
            player: RwLock::new(None),
            out_file: out_dir.into().join(OUT_FILE_NAME),
            speed: AtomicI32::new(0),
            process: Mutex::new(None),
            active: AtomicBool::new(true),
            abort,
        };
        handler.set_player(preferred, advanced);
        handler
    }

    pub fn available_players(&self) -> &[&'static CommandDescriptor] {
        &self.available_players
    }

    pub fn player_available(&self) -> bool {
        !self.available_players.is_empty()
    }

    pub fn has_advanced_player(&self) -> bool {
        self.has_advanced_player
    }

    fn find_available(&self, id: &str) -> Option<&'static CommandDescriptor> {
        self.available_players.iter().copied().find(|p| p.id == id)
    }

    fn current(&self) -> Option<&'static CommandDescriptor> {
        self.player.read().ok().and_then(|player| *player)
    }

    /// Select the active player: the preferred one if available, else the
    /// first advanced one when `advanced` is requested, else the first found.
    pub fn set_player(
        &self,
        preferred: Option<&str>,
        advanced: bool,
    ) -> Option<&'static CommandDescriptor> {
        let selected = if let Some(p) = preferred.and_then(|id| self.find_available(id)) {
            Some(p)
        } else if advanced && self.has_advanced_player {
            self.available_players.iter().copied().find(|p| p.is_advanced())
        } else {
            self.available_players.first().copied()
        };

        if let Ok(mut player) = self.player.write() {
            let old = *player;
            *player = selected;
            if let Some(p) = selected {
                if old.map(|o| o.id) != Some(p.id) {
                    info!("🔈 External player: {}", p.name);
                }
            }
        }
        selected
    }
}

impl PlayerHandler for ExternalPlayerHandler {
    fn set_speed(&self, speed: i32) {
        self.speed.store(speed, Ordering::SeqCst);
    }

    fn player(&self) -> Option<&'static str> {
        self.current().map(|p| p.id)
    }

    fn out_file(&self) -> TtsResult<PathBuf> {
        if let Some(dir) = self.out_file.parent() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(self.out_file.clone())
    }

    fn play(&self) -> TtsResult<()> {
        if !self.active.load(Ordering::SeqCst) {
            return Err(TtsError::HandlerClosed);
        }
        let player = self
            .current()
            .ok_or_else(|| TtsError::ProcessUnavailable("no external player selected".into()))?;

        let args = player.play_args(&self.out_file, self.speed.load(Ordering::SeqCst));
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| TtsError::ProcessUnavailable(format!("{} has no command", player.id)))?;

        debug!("▶️ {}: {:?}", player.name, args);
        let child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| TtsError::ProcessUnavailable(format!("{}: {}", player.name, e)))?;
        *self.process.lock()? = Some(child);

        while self.active.load(Ordering::SeqCst) && !self.abort.is_aborted() {
            let running = match self.process.lock()?.as_mut() {
                Some(child) => still_running(child),
                None => false,
            };
            if !running {
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        if self.abort.is_aborted() {
            self.stop();
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        match self.process.lock() {
            Ok(mut process) => process.as_mut().map(still_running).unwrap_or(false),
            Err(_) => false,
        }
    }

    fn stop(&self) {
        let Ok(mut process) = self.process.lock() else {
            return;
        };
        let Some(child) = process.as_mut() else {
            return;
        };
        if !still_running(child) {
            return;
        }

        let kill = self.current().map(|p| p.kill).unwrap_or(true);
        let result = if kill {
            child.kill().map_err(TtsError::from)
        } else {
            terminate(child)
        };
        if let Err(e) = result {
            debug!("Stopping player process failed: {}", e);
        }
    }

    fn close(&self) {
        self.active.store(false, Ordering::SeqCst);

        let Ok(mut process) = self.process.lock() else {
            return;
        };
        if let Some(child) = process.as_mut() {
            if let Err(e) = child.kill() {
                debug!("Killing player process failed: {}", e);
            }
            let _ = child.wait();
        }
    }
}

impl std::fmt::Debug for ExternalPlayerHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalPlayerHandler")
            .field("player", &self.player())
            .field(
                "available",
                &self.available_players.iter().map(|p| p.id).collect::<Vec<_>>(),
            )
            .field("out_file", &self.out_file)
            .finish()
    }
}

impl Drop for ExternalPlayerHandler {
    fn drop(&mut self) {
        self.close();
    }
}
