//! Whole-conversation audio stitching

use std::path::{Path, PathBuf};

use callsim_core::{AudioClip, TARGET_SAMPLE_RATE};

use crate::PipelineError;

/// Fixed silence inserted between consecutive segments
pub const STITCH_GAP_MS: u64 = 150;

/// Concatenate the given WAV files, in order, into one mono 16 kHz WAV.
///
/// Unreadable inputs are skipped with a warning; when nothing is readable
/// no output file is produced and `Ok(None)` is returned. A failure to
/// write the stitched file itself propagates.
pub fn stitch_wavs(paths: &[PathBuf], out_path: &Path) -> Result<Option<PathBuf>, PipelineError> {
    let mut clips = Vec::new();
    for path in paths {
        match AudioClip::read_wav(path) {
            Ok(clip) => clips.push(clip),
            Err(e) => {
                tracing::warn!("failed reading audio {}: {e}", path.display());
            }
        }
    }

    if clips.is_empty() {
        tracing::warn!("no audio segments to stitch");
        return Ok(None);
    }

    let mut stitched = clips[0].to_standard();
    for clip in &clips[1..] {
        stitched.append(&AudioClip::silence(STITCH_GAP_MS, TARGET_SAMPLE_RATE));
        stitched.append(clip);
    }

    stitched.write_wav(out_path)?;
    tracing::info!(
        "stitched {} segments into {} ({} ms)",
        clips.len(),
        out_path.display(),
        stitched.duration_ms()
    );
    Ok(Some(out_path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_clip(dir: &Path, name: &str, ms: u64) -> PathBuf {
        let path = dir.join(name);
        AudioClip::silence(ms, 16_000).write_wav(&path).unwrap();
        path
    }

    #[test]
    fn test_two_segments_with_gap() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_clip(dir.path(), "a.wav", 1000);
        let b = write_clip(dir.path(), "b.wav", 1000);
        let out = dir.path().join("full.wav");

        let stitched = stitch_wavs(&[a, b], &out).unwrap().unwrap();
        let clip = AudioClip::read_wav(&stitched).unwrap();
        assert!(clip.duration_ms() >= 2150);
    }

    #[test]
    fn test_zero_readable_inputs_produce_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("full.wav");
        let missing = vec![dir.path().join("gone.wav")];

        let result = stitch_wavs(&missing, &out).unwrap();
        assert!(result.is_none());
        assert!(!out.exists());
    }

    #[test]
    fn test_unreadable_inputs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_clip(dir.path(), "good.wav", 500);
        let bad = dir.path().join("bad.wav");
        std::fs::write(&bad, b"garbage").unwrap();
        let out = dir.path().join("full.wav");

        let stitched = stitch_wavs(&[bad, good], &out).unwrap().unwrap();
        let clip = AudioClip::read_wav(&stitched).unwrap();
        // one readable clip, no gap added
        assert!(clip.duration_ms() >= 490 && clip.duration_ms() < 600);
    }

    #[test]
    fn test_mixed_rates_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a48k.wav");
        AudioClip::silence(500, 48_000).write_wav(&a).unwrap();
        let b = write_clip(dir.path(), "b16k.wav", 500);
        let out = dir.path().join("full.wav");

        let stitched = stitch_wavs(&[a, b], &out).unwrap().unwrap();
        let spec = hound::WavReader::open(&stitched).unwrap().spec();
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.channels, 1);
    }
}
