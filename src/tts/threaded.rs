//! Threaded speech queue
//!
//! Callers enqueue utterances and pauses; a single worker thread feeds them to
//! the engine one at a time, so callers never block on synthesis or playback.

use super::{ProviderSettings, SettingsTracker, SpeechBackend, ThreadedEngine, DEFAULT_PAUSE_MS};
use crate::error::TtsResult;
use crate::host::AbortToken;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// How long the worker waits on the queue before re-checking its flags
const QUEUE_POLL: Duration = Duration::from_millis(500);

/// Unit of work for the worker thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    Utterance(String),
    Pause(Duration),
}

struct Shared<E> {
    engine: E,
    tx: Sender<WorkItem>,
    rx: Receiver<WorkItem>,
    /// Items enqueued and not yet finished or discarded
    pending: AtomicUsize,
    speaking: AtomicBool,
    active: AtomicBool,
    abort: AbortToken,
}

impl<E: ThreadedEngine> Shared<E> {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn enqueue(&self, item: WorkItem) {
        if !self.is_active() {
            return;
        }
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(item).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        // Lost a race with shutdown; nothing will pick the item up
        if !self.is_active() {
            self.drain();
        }
    }

    /// Discard everything not yet picked up by the worker
    fn drain(&self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            dropped += 1;
        }
        dropped
    }

    fn run(&self) {
        let provider = self.engine.provider();
        info!("🧵 Threaded TTS started: {}", provider);

        while self.is_active() && !self.abort.is_aborted() {
            let item = match self.rx.recv_timeout(QUEUE_POLL) {
                Ok(item) => item,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            match item {
                WorkItem::Pause(duration) => {
                    self.abort.sleep(duration);
                }
                WorkItem::Utterance(text) => {
                    self.speaking.store(true, Ordering::SeqCst);
                    debug!("🗣️ {} speaking: {:?}", provider, text);
                    if let Err(e) = self.engine.threaded_say(&text) {
                        error!("❌ {} failed to speak {:?}: {}", provider, text, e);
                    }
                    self.speaking.store(false, Ordering::SeqCst);
                }
            }
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }

        self.active.store(false, Ordering::SeqCst);
        let dropped = self.drain();
        if dropped > 0 {
            debug!("🛑 Discarded {} queued item(s) on shutdown", dropped);
        }
        info!("🧵 Threaded TTS finished: {}", provider);
    }
}

/// Backend running a [`ThreadedEngine`] on its own worker thread
pub struct ThreadedBackend<E: ThreadedEngine> {
    shared: Arc<Shared<E>>,
    settings: SettingsTracker,
    worker: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl<E: ThreadedEngine> ThreadedBackend<E> {
    /// Start the worker thread for `engine`
    pub fn new(engine: E, settings: ProviderSettings, abort: AbortToken) -> TtsResult<Self> {
        let (tx, rx) = unbounded();
        let shared = Arc::new(Shared {
            engine,
            tx,
            rx,
            pending: AtomicUsize::new(0),
            speaking: AtomicBool::new(false),
            active: AtomicBool::new(true),
            abort,
        });

        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name(format!("tts-{}", shared.engine.provider()))
            .spawn(move || worker_shared.run())?;

        Ok(Self {
            shared,
            settings: SettingsTracker::new(settings),
            worker: Mutex::new(Some(worker)),
            closed: AtomicBool::new(false),
        })
    }

    pub fn engine(&self) -> &E {
        &self.shared.engine
    }

    pub fn settings(&self) -> &SettingsTracker {
        &self.settings
    }

    /// False once closed, or once the worker has quit on a host abort
    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }

    pub fn say(&self, text: &str, interrupt: bool) {
        if !self.is_active() {
            return;
        }
        if interrupt {
            self.stop();
        }
        self.shared.enqueue(WorkItem::Utterance(text.to_string()));
    }

    /// Queue `texts` with a pause between consecutive items
    pub fn say_list(&self, texts: &[String], interrupt: bool) {
        if !self.is_active() {
            return;
        }
        if interrupt {
            self.stop();
        }
        let Some((first, rest)) = texts.split_first() else {
            return;
        };
        self.shared.enqueue(WorkItem::Utterance(first.clone()));
        for text in rest {
            self.insert_pause(DEFAULT_PAUSE_MS);
            self.shared.enqueue(WorkItem::Utterance(text.clone()));
        }
    }

    pub fn insert_pause(&self, ms: u64) {
        if !self.is_active() {
            return;
        }
        self.shared.enqueue(WorkItem::Pause(Duration::from_millis(ms)));
    }

    /// Speaking now, or holding work that hasn't finished yet
    pub fn is_speaking(&self) -> bool {
        self.shared.speaking.load(Ordering::SeqCst)
            || self.shared.pending.load(Ordering::SeqCst) > 0
            || self.shared.engine.is_speaking()
    }

    /// Drop pending items, then let the engine interrupt the current one
    pub fn stop(&self) {
        let dropped = self.shared.drain();
        if dropped > 0 {
            debug!("🛑 Discarded {} queued item(s)", dropped);
        }
        self.shared.engine.stop();
    }

    /// Stop the worker and release the engine. Safe to call more than once.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.active.store(false, Ordering::SeqCst);
        self.stop();
        self.shared.engine.close();
        self.shared.drain();

        let worker = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(worker) = worker {
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                error!("❌ TTS worker for {} panicked", self.shared.engine.provider());
            }
        }
    }
}

impl<E: ThreadedEngine> Drop for ThreadedBackend<E> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<E: ThreadedEngine> SpeechBackend for ThreadedBackend<E> {
    fn provider(&self) -> &'static str {
        self.shared.engine.provider()
    }

    fn display_name(&self) -> &'static str {
        self.shared.engine.display_name()
    }

    fn say(&self, text: &str, interrupt: bool) -> TtsResult<()> {
        ThreadedBackend::say(self, text, interrupt);
        Ok(())
    }

    fn say_list(&self, texts: &[String], interrupt: bool) -> TtsResult<()> {
        ThreadedBackend::say_list(self, texts, interrupt);
        Ok(())
    }

    fn insert_pause(&self, ms: u64) {
        ThreadedBackend::insert_pause(self, ms);
    }

    fn voices(&self) -> Option<Vec<String>> {
        self.shared.engine.voices()
    }

    fn is_speaking(&self) -> Option<bool> {
        Some(ThreadedBackend::is_speaking(self))
    }

    fn refresh_settings(&self) {
        self.settings.refresh(&self.shared.engine);
    }

    fn stop(&self) {
        ThreadedBackend::stop(self);
    }

    fn close(&self) {
        ThreadedBackend::close(self);
    }
}
