//! Wav playback
//!
//! A `WavPlayer` owns exactly one `PlayerHandler` and picks it according to
//! what the host can do: the built-in handler when the host can stop its own
//! sounds, otherwise an external command-line player, falling back to the
//! built-in handler when no external player is installed.

use crate::error::TtsResult;
use crate::host::{AbortToken, SoundHost};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::info;

pub mod builtin;
pub mod commands;
pub mod engine;
pub mod external;
pub mod wav;

pub use builtin::{BuiltinHandler, BUILTIN_ID};
pub use commands::CommandDescriptor;
pub use engine::SoundEngine;
pub use external::ExternalPlayerHandler;

/// One playback strategy
pub trait PlayerHandler: Send + Sync {
    /// Speed for subsequent plays (0 = unchanged). Ignored by default.
    fn set_speed(&self, _speed: i32) {}

    /// Id of the player in use, if any
    fn player(&self) -> Option<&'static str>;

    /// Path the next wav should be written to
    fn out_file(&self) -> TtsResult<PathBuf>;

    /// Play the last wav returned by `out_file`, blocking until it ends
    fn play(&self) -> TtsResult<()>;

    fn is_playing(&self) -> bool;

    /// Interrupt playback, where the strategy supports it
    fn stop(&self);

    /// Release resources. Terminal and idempotent.
    fn close(&self);
}

/// Builds external handlers against a player registry
#[derive(Debug, Clone)]
pub struct ExternalPlayerFactory {
    registry: &'static [CommandDescriptor],
    out_dir: PathBuf,
    abort: AbortToken,
}

impl ExternalPlayerFactory {
    pub fn new(
        registry: &'static [CommandDescriptor],
        out_dir: impl Into<PathBuf>,
        abort: AbortToken,
    ) -> Self {
        Self {
            registry,
            out_dir: out_dir.into(),
            abort,
        }
    }

    /// Factory for the current platform's registry
    pub fn platform(out_dir: impl Into<PathBuf>, abort: AbortToken) -> Self {
        Self::new(commands::registry(), out_dir, abort)
    }

    pub fn create(&self, preferred: Option<&str>, advanced: bool) -> ExternalPlayerHandler {
        ExternalPlayerHandler::new(
            self.registry,
            self.out_dir.clone(),
            self.abort.clone(),
            preferred,
            advanced,
        )
    }
}

/// Options for building a `WavPlayer`
#[derive(Clone)]
pub struct PlayerOptions {
    pub sound: Arc<dyn SoundHost>,
    pub abort: AbortToken,
    pub out_dir: PathBuf,
    pub external: Option<ExternalPlayerFactory>,
    pub preferred: Option<String>,
    pub advanced: bool,
}

impl PlayerOptions {
    /// Built-in playback plus the platform's external players
    pub fn new(sound: Arc<dyn SoundHost>, abort: AbortToken, out_dir: impl Into<PathBuf>) -> Self {
        let out_dir = out_dir.into();
        Self {
            external: Some(ExternalPlayerFactory::platform(out_dir.clone(), abort.clone())),
            sound,
            abort,
            out_dir,
            preferred: None,
            advanced: false,
        }
    }

    pub fn with_external(mut self, external: Option<ExternalPlayerFactory>) -> Self {
        self.external = external;
        self
    }

    pub fn with_preferred(mut self, preferred: Option<&str>) -> Self {
        self.preferred = preferred.map(str::to_string);
        self
    }

    pub fn with_advanced(mut self, advanced: bool) -> Self {
        self.advanced = advanced;
        self
    }
}

/// Facade owning the active playback handler
pub struct WavPlayer {
    handler: RwLock<Arc<dyn PlayerHandler>>,
    options: PlayerOptions,
    preferred: Mutex<Option<String>>,
    speed: AtomicI32,
}

impl WavPlayer {
    pub fn new(options: PlayerOptions) -> Self {
        let preferred = options.preferred.clone();
        let handler = Self::select(&options, preferred.as_deref());
        Self {
            handler: RwLock::new(handler),
            options,
            preferred: Mutex::new(preferred),
            speed: AtomicI32::new(0),
        }
    }

    fn builtin(options: &PlayerOptions) -> Arc<dyn PlayerHandler> {
        Arc::new(BuiltinHandler::new(
            options.sound.clone(),
            options.abort.clone(),
            options.out_dir.clone(),
        ))
    }

    /// Handler for `preferred`, or the default choice when it can't be had
    fn select(options: &PlayerOptions, preferred: Option<&str>) -> Arc<dyn PlayerHandler> {
        if let (Some(id), Some(factory)) = (preferred, &options.external) {
            let external = factory.create(Some(id), options.advanced);
            if external.player() == Some(id) {
                return Arc::new(external);
            }
        }
        Self::default_handler(options)
    }

    fn default_handler(options: &PlayerOptions) -> Arc<dyn PlayerHandler> {
        if options.sound.can_stop_sound() {
            info!("🔊 Host can stop sounds - using builtin playback");
            return Self::builtin(options);
        }
        info!("Host cannot stop sounds");

        if let Some(factory) = &options.external {
            let external = factory.create(None, options.advanced);
            if external.player_available() {
                info!("🔈 Using external player");
                return Arc::new(external);
            }
        }
        info!("No external player - falling back to builtin playback");
        Self::builtin(options)
    }

    fn handler(&self) -> Arc<dyn PlayerHandler> {
        match self.handler.read() {
            Ok(handler) => handler.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Switch to `preferred`. No-op if it's already the active player.
    pub fn set_player(&self, preferred: Option<&str>) {
        if let Ok(mut current) = self.preferred.lock() {
            *current = preferred.map(str::to_string);
        }
        if preferred == self.player() {
            return;
        }

        let next = Self::select(&self.options, preferred);
        let previous = match self.handler.write() {
            Ok(mut handler) => std::mem::replace(&mut *handler, next),
            Err(_) => return,
        };
        previous.close();
    }

    /// Id of the active handler's player
    pub fn player(&self) -> Option<&'static str> {
        self.handler().player()
    }

    pub fn preferred(&self) -> Option<String> {
        self.preferred.lock().ok().and_then(|p| p.clone())
    }

    /// Remember `speed`; it is applied to whichever handler plays next
    pub fn set_speed(&self, speed: i32) {
        self.speed.store(speed, Ordering::SeqCst);
        self.handler().set_speed(speed);
    }

    pub fn speed(&self) -> i32 {
        self.speed.load(Ordering::SeqCst)
    }

    pub fn out_file(&self) -> TtsResult<PathBuf> {
        self.handler().out_file()
    }

    pub fn play(&self) -> TtsResult<()> {
        let handler = self.handler();
        handler.set_speed(self.speed());
        handler.play()
    }

    pub fn is_playing(&self) -> bool {
        self.handler().is_playing()
    }

    pub fn stop(&self) {
        self.handler().stop();
    }

    pub fn close(&self) {
        self.handler().close();
    }
}

impl std::fmt::Debug for WavPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavPlayer")
            .field("player", &self.player())
            .field("preferred", &self.preferred())
            .field("advanced", &self.options.advanced)
            .field("speed", &self.speed())
            .finish()
    }
}
