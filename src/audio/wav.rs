//! Wav header inspection

use crate::error::{TtsError, TtsResult};
use hound::WavReader;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Playback length of a wav file, from the header's frame count and sample rate
pub fn wav_duration<P: AsRef<Path>>(path: P) -> TtsResult<Duration> {
    let reader = WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(TtsError::Audio(format!(
            "Invalid sample rate in {}",
            path.as_ref().display()
        )));
    }

    let frames = reader.duration();
    let seconds = f64::from(frames) / f64::from(spec.sample_rate);
    debug!(
        "WAV {:?}: {} frames @ {} Hz = {:.3}s",
        path.as_ref().file_name().unwrap_or_default(),
        frames,
        spec.sample_rate,
        seconds
    );
    Ok(Duration::from_secs_f64(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn write_silence(path: &Path, sample_rate: u32, channels: u16, frames: u32) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).expect("create wav");
        for _ in 0..frames * u32::from(channels) {
            writer.write_sample(0i16).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }

    #[test]
    fn test_duration_uses_frames_not_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_silence(&path, 8000, 2, 4000);

        let duration = wav_duration(&path).unwrap();
        assert_eq!(duration, Duration::from_millis(500));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = wav_duration(dir.path().join("nope.wav")).unwrap_err();
        assert!(matches!(err, TtsError::Io(_)));
    }

    #[test]
    fn test_garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a RIFF header").unwrap();
        assert!(wav_duration(&path).is_err());
    }
}
