//! Mock sound host recording what it was asked to play

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tts_service::host::SoundHost;
use tts_service::TtsResult;

#[derive(Debug)]
pub struct MockSound {
    can_stop: bool,
    played: Mutex<Vec<PathBuf>>,
    stops: AtomicUsize,
}

impl MockSound {
    pub fn new(can_stop: bool) -> Self {
        Self {
            can_stop,
            played: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn played(&self) -> Vec<PathBuf> {
        self.played.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl SoundHost for MockSound {
    fn play_sound(&self, path: &Path) -> TtsResult<()> {
        self.played.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn can_stop_sound(&self) -> bool {
        self.can_stop
    }

    fn stop_sound(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
