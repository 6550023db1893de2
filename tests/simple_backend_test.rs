//! Wav engine backend tests, played through the built-in handler

mod common;

use common::mock_sound::MockSound;
use common::mock_tts::{BareWavTts, MockWavTts};
use common::{settings, wait_until};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tts_service::audio::{PlayerOptions, WavPlayer};
use tts_service::host::AbortToken;
use tts_service::tts::{SimpleBackend, SpeechBackend, SpeechMode, WavEngine};

const TIMEOUT: Duration = Duration::from_secs(5);

fn builtin_player(sound: &Arc<MockSound>, dir: &Path) -> WavPlayer {
    WavPlayer::new(PlayerOptions::new(sound.clone(), AbortToken::new(), dir).with_external(None))
}

fn backend<E: WavEngine>(engine: E, sound: &Arc<MockSound>, dir: &Path) -> SimpleBackend<E> {
    let (_, settings) = settings();
    SimpleBackend::new(engine, settings, builtin_player(sound, dir), AbortToken::new()).unwrap()
}

#[test]
fn test_wav_out_renders_then_plays() {
    let dir = tempfile::tempdir().unwrap();
    let sound = Arc::new(MockSound::new(true));
    let tts = backend(MockWavTts::wav_out(Duration::from_millis(100)), &sound, dir.path());
    assert_eq!(tts.mode(), SpeechMode::WavOut);

    tts.say("hello", false);
    tts.say("world", false);
    assert!(tts.is_speaking());

    assert!(wait_until(TIMEOUT, || !tts.is_speaking()));
    assert_eq!(tts.engine().rendered(), vec!["hello", "world"]);

    let played = sound.played();
    assert_eq!(played.len(), 2);
    assert_ne!(played[0], played[1]);
    assert!(played.iter().all(|p| p.starts_with(dir.path())));
}

#[test]
fn test_empty_text_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let sound = Arc::new(MockSound::new(true));
    let tts = backend(MockWavTts::wav_out(Duration::from_millis(50)), &sound, dir.path());

    tts.say("", false);
    assert!(wait_until(TIMEOUT, || !tts.is_speaking()));
    assert!(tts.engine().rendered().is_empty());
    assert!(sound.played().is_empty());
}

#[test]
fn test_engine_speak_bypasses_player() {
    let dir = tempfile::tempdir().unwrap();
    let sound = Arc::new(MockSound::new(true));
    let tts = backend(
        MockWavTts::engine_speak(Duration::from_millis(300)),
        &sound,
        dir.path(),
    );
    assert_eq!(tts.mode(), SpeechMode::EngineSpeak);

    let start = Instant::now();
    tts.say("hi", false);
    assert!(wait_until(TIMEOUT, || tts.engine().rendered().len() == 1));
    assert!(tts.is_speaking());

    assert!(wait_until(TIMEOUT, || !tts.is_speaking()));
    assert!(start.elapsed() >= Duration::from_millis(250));
    assert!(sound.played().is_empty());
}

#[test]
fn test_engine_speak_stop_ends_utterance() {
    let dir = tempfile::tempdir().unwrap();
    let sound = Arc::new(MockSound::new(true));
    let tts = backend(
        MockWavTts::engine_speak(Duration::from_secs(10)),
        &sound,
        dir.path(),
    );

    tts.say("long", false);
    assert!(wait_until(TIMEOUT, || tts.engine().rendered().len() == 1));

    let start = Instant::now();
    tts.stop();
    assert!(wait_until(TIMEOUT, || !tts.is_speaking()));
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_missing_engine_support_is_logged_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let sound = Arc::new(MockSound::new(true));
    let tts = backend(BareWavTts, &sound, dir.path());

    tts.say("one", false);
    tts.say("two", false);
    assert!(wait_until(TIMEOUT, || !tts.is_speaking()));
    assert!(sound.played().is_empty());

    tts.say("three", false);
    assert!(wait_until(TIMEOUT, || !tts.is_speaking()));
}

#[test]
fn test_stop_interrupts_playback() {
    let dir = tempfile::tempdir().unwrap();
    let sound = Arc::new(MockSound::new(true));
    let tts = backend(MockWavTts::wav_out(Duration::from_secs(5)), &sound, dir.path());

    tts.say("long", false);
    tts.say("dropped", false);
    assert!(wait_until(TIMEOUT, || tts.player().is_playing()));

    let start = Instant::now();
    tts.stop();
    assert!(wait_until(TIMEOUT, || !tts.is_speaking()));
    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(tts.engine().rendered(), vec!["long"]);
    assert_eq!(sound.stops(), 1);
}

#[test]
fn test_interrupting_say_replaces_current_speech() {
    let dir = tempfile::tempdir().unwrap();
    let sound = Arc::new(MockSound::new(true));
    let tts = backend(MockWavTts::wav_out(Duration::from_secs(5)), &sound, dir.path());

    tts.say("long", false);
    tts.say("dropped", false);
    assert!(wait_until(TIMEOUT, || tts.player().is_playing()));

    tts.say_list(&["urgent".to_string()], true);
    assert!(wait_until(Duration::from_secs(3), || {
        tts.engine().rendered().len() == 2
    }));
    assert_eq!(tts.engine().rendered(), vec!["long", "urgent"]);

    tts.stop();
    assert!(wait_until(TIMEOUT, || !tts.is_speaking()));
}

#[test]
fn test_settings_reach_engine_and_player() {
    let dir = tempfile::tempdir().unwrap();
    let sound = Arc::new(MockSound::new(true));
    let (shared, settings) = settings();
    let tts = SimpleBackend::new(
        MockWavTts::wav_out(Duration::from_millis(10)),
        settings,
        builtin_player(&sound, dir.path()),
        AbortToken::new(),
    )
    .unwrap();

    tts.refresh_settings();
    assert!(tts.engine().updates().is_empty());
    assert_eq!(tts.player().speed(), 0);

    shared.set("speed.mock", 40);
    tts.refresh_settings();
    assert_eq!(tts.engine().updates(), vec![(None, Some(40))]);
    assert_eq!(tts.player().speed(), 40);

    SpeechBackend::set_speed(&tts, 75);
    assert_eq!(tts.player().speed(), 75);

    // Unchanged settings leave a directly set speed alone
    tts.refresh_settings();
    assert_eq!(tts.player().speed(), 75);
    assert_eq!(tts.engine().updates().len(), 1);

    shared.set("speed.mock", 60);
    tts.refresh_settings();
    assert_eq!(tts.player().speed(), 60);
}

#[test]
fn test_baseline_speed_reaches_player() {
    let dir = tempfile::tempdir().unwrap();
    let sound = Arc::new(MockSound::new(true));
    let (shared, settings) = settings();
    shared.set("speed.mock", 120);
    let tts = SimpleBackend::new(
        MockWavTts::wav_out(Duration::from_millis(10)),
        settings,
        builtin_player(&sound, dir.path()),
        AbortToken::new(),
    )
    .unwrap();

    tts.refresh_settings();
    assert!(tts.engine().updates().is_empty());
    assert_eq!(tts.player().speed(), 120);
}

#[test]
fn test_close_releases_player() {
    let dir = tempfile::tempdir().unwrap();
    let sound = Arc::new(MockSound::new(true));
    let tts = backend(MockWavTts::wav_out(Duration::from_millis(20)), &sound, dir.path());

    tts.say("hello", false);
    assert!(wait_until(TIMEOUT, || !tts.is_speaking()));
    assert_eq!(sound.played().len(), 1);
    assert!(sound.played()[0].exists());

    tts.close();
    tts.close();
    assert!(!sound.played()[0].exists());

    tts.say("ignored", false);
    assert!(!tts.is_speaking());
    assert_eq!(tts.engine().rendered(), vec!["hello"]);
}
