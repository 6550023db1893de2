//! Sound Engine for in-process playback
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream.
//! The engine spawns a dedicated audio thread that owns the playback infrastructure.

use crate::error::{TtsError, TtsResult};
use crate::host::SoundHost;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Commands sent to the audio thread
enum AudioCommand {
    PlayFile(PathBuf),
    Stop,
}

/// Thread-safe handle to the sound engine
#[derive(Clone)]
pub struct SoundEngine {
    sender: mpsc::Sender<AudioCommand>,
}

impl std::fmt::Debug for SoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundEngine").finish()
    }
}

impl SoundEngine {
    /// Start the audio thread. Fails if no output device can be opened.
    pub fn new() -> anyhow::Result<Self> {
        let (sender, receiver) = mpsc::channel::<AudioCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("tts-audio".into())
            .spawn(move || {
                Self::audio_thread(receiver, ready_tx);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { sender }),
            Ok(Err(e)) => Err(anyhow::anyhow!("Audio output unavailable: {}", e)),
            Err(_) => Err(anyhow::anyhow!("Audio thread exited during startup")),
        }
    }

    fn audio_thread(
        receiver: mpsc::Receiver<AudioCommand>,
        ready: mpsc::Sender<Result<(), String>>,
    ) {
        use rodio::OutputStream;

        // Initialize audio output on this thread
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(s) => s,
            Err(e) => {
                warn!("🔇 Failed to initialize audio output: {}", e);
                let _ = ready.send(Err(e.to_string()));
                return;
            }
        };

        // Dropping the stream silences the sink
        let _stream = stream;
        let mut sink = match rodio::Sink::try_new(&stream_handle) {
            Ok(s) => s,
            Err(e) => {
                error!("❌ Failed to create audio sink: {}", e);
                let _ = ready.send(Err(e.to_string()));
                return;
            }
        };

        let _ = ready.send(Ok(()));
        info!("🔊 Builtin audio output ready");

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                AudioCommand::PlayFile(path) => {
                    debug!("🔊 Playing file: {:?}", path);
                    if let Err(e) = Self::append_wav(&sink, &path) {
                        error!("❌ Audio playback failed for {:?}: {}", path, e);
                    }
                }
                AudioCommand::Stop => {
                    debug!("🛑 Stopping all playback");
                    sink.stop();
                    // A stopped sink stays stopped
                    if let Ok(new_sink) = rodio::Sink::try_new(&stream_handle) {
                        sink = new_sink;
                    }
                }
            }
        }

        info!("🔇 Builtin audio output closed");
    }

    fn append_wav(sink: &rodio::Sink, path: &Path) -> anyhow::Result<()> {
        use rodio::Decoder;
        use std::fs::File;
        use std::io::BufReader;

        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Cannot open wav {:?}: {}", path, e))?;
        sink.append(Decoder::new_wav(BufReader::new(file))?);
        Ok(())
    }
}

impl SoundHost for SoundEngine {
    fn play_sound(&self, path: &Path) -> TtsResult<()> {
        self.sender
            .send(AudioCommand::PlayFile(path.to_path_buf()))
            .map_err(|e| TtsError::Audio(format!("Audio thread disconnected: {}", e)))
    }

    fn can_stop_sound(&self) -> bool {
        true
    }

    fn stop_sound(&self) {
        if self.sender.send(AudioCommand::Stop).is_err() {
            warn!("⚠️ Audio thread disconnected, cannot stop playback");
        }
    }
}
