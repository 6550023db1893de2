//! TTS Service - speak text from the command line or stdin

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tts_service::audio::{commands, ExternalPlayerFactory, SoundEngine};
use tts_service::config::{Config, SharedConfig};
use tts_service::host::{AbortToken, Host, NoSound, SoundHost};
use tts_service::tts::{self, BackendContext, SpeechBackend};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// TTS backend (piper, espeak, log, auto)
    #[arg(short, long)]
    backend: Option<String>,

    /// Preferred external wav player (aplay, paplay, sox, mplayer)
    #[arg(short, long)]
    player: Option<String>,

    /// Prefer a player that supports speed adjustment
    #[arg(long)]
    advanced: bool,

    /// Playback speed passed to the player (0 = unchanged)
    #[arg(long)]
    speed: Option<i32>,

    /// List installed external players and exit
    #[arg(long)]
    list_players: bool,

    /// Text to speak; reads lines from stdin when omitted
    texts: Vec<String>,
}

fn init_logging(verbose: bool, level: &str) {
    let default = if verbose {
        "debug".to_string()
    } else {
        level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn list_players(audio_dir: PathBuf, abort: AbortToken) {
    let external = ExternalPlayerFactory::platform(audio_dir, abort).create(None, false);
    for player in commands::registry() {
        let installed = external.available_players().iter().any(|p| p.id == player.id);
        let speed = if player.is_advanced() { " (speed)" } else { "" };
        let marker = if installed { "*" } else { " " };
        println!("{} {:<8} {}{}", marker, player.id, player.name, speed);
    }
}

async fn wait_until_idle(backend: &Arc<dyn SpeechBackend>, abort: &AbortToken) {
    while backend.is_speaking().unwrap_or(false) && !abort.is_aborted() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

fn interrupt(backend: &Arc<dyn SpeechBackend>, abort: &AbortToken) {
    info!("🛑 Interrupted");
    abort.abort();
    backend.stop();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;
    init_logging(args.verbose, &config.log_level);

    info!("🗣️ TTS Service v{} starting...", env!("CARGO_PKG_VERSION"));

    let abort = AbortToken::new();
    let audio_dir = PathBuf::from(&config.audio_dir);

    if args.list_players {
        list_players(audio_dir, abort);
        return Ok(());
    }

    let sound: Arc<dyn SoundHost> = match SoundEngine::new() {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            warn!("🔇 {} - builtin playback disabled", e);
            Arc::new(NoSound)
        }
    };

    let backend_name = args.backend.clone().unwrap_or_else(|| config.backend.clone());
    let player = args
        .player
        .clone()
        .or_else(|| config.preferred_player().map(str::to_string));
    let ctx = BackendContext {
        settings: Arc::new(SharedConfig::new(config.clone())),
        host: Host::new(sound, abort.clone()),
        audio_dir,
        player,
        advanced: args.advanced || config.advanced_player,
    };
    let backend = tts::create_backend(&backend_name, &ctx)?;
    backend.refresh_settings();
    if let Some(speed) = args.speed {
        backend.set_speed(speed);
    }

    if !args.texts.is_empty() {
        backend.say_list(&args.texts, false)?;
    } else {
        info!("✅ Ready - type text to speak ('!' interrupts, '/stop' stops)");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    interrupt(&backend, &abort);
                    break;
                }
            };
            let Some(line) = line else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            backend.refresh_settings();
            match line {
                "/stop" => backend.stop(),
                _ => match line.strip_prefix('!') {
                    Some(text) => backend.say(text.trim(), true)?,
                    None => backend.say(line, false)?,
                },
            }
        }
    }

    tokio::select! {
        _ = wait_until_idle(&backend, &abort) => {}
        _ = tokio::signal::ctrl_c() => interrupt(&backend, &abort),
    }

    let closing = backend.clone();
    tokio::task::spawn_blocking(move || closing.close()).await?;
    info!("👋 TTS Service stopped");
    Ok(())
}
