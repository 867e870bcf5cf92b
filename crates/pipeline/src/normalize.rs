//! WAV normalization to the pipeline's standard mono 16 kHz form

use std::path::Path;

use callsim_core::{AudioClip, TARGET_SAMPLE_RATE};

use crate::PipelineError;

/// Rewrite `path` as mono 16 kHz 16-bit PCM.
///
/// Idempotent: a file already in standard form is left untouched. The
/// caller keeps the original file when this fails.
pub fn ensure_wav_mono_16k(path: &Path) -> Result<(), PipelineError> {
    let spec = hound::WavReader::open(path)
        .map_err(|e| PipelineError::Audio(format!("{}: {e}", path.display())))?
        .spec();

    if spec.channels == 1
        && spec.sample_rate == TARGET_SAMPLE_RATE
        && spec.sample_format == hound::SampleFormat::Int
        && spec.bits_per_sample == 16
    {
        return Ok(());
    }

    let clip = AudioClip::read_wav(path)?.to_standard();
    clip.write_wav(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resamples_to_16k_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hi_rate.wav");
        AudioClip::silence(500, 48_000).write_wav(&path).unwrap();

        ensure_wav_mono_16k(&path).unwrap();

        let spec = hound::WavReader::open(&path).unwrap().spec();
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.channels, 1);
    }

    #[test]
    fn test_idempotent_on_standard_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("standard.wav");
        AudioClip::tone(300.0, 200, 16_000).write_wav(&path).unwrap();

        let before = std::fs::read(&path).unwrap();
        ensure_wav_mono_16k(&path).unwrap();
        let after = std::fs::read(&path).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.wav");
        std::fs::write(&path, b"not audio").unwrap();
        assert!(ensure_wav_mono_16k(&path).is_err());
    }
}
