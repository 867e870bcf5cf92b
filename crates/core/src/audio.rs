//! Audio clip handling
//!
//! Clips are held as mono f32 samples normalized to [-1.0, 1.0]. WAV files
//! are read through `hound` (16-bit PCM and f32 input, any channel count)
//! and written back as 16-bit PCM mono, which is what every downstream
//! consumer (recognition, stitching) expects.

use std::path::Path;

use crate::error::{Error, Result};
use crate::TARGET_SAMPLE_RATE;

const PCM16_SCALE: f32 = 32767.0;
const PCM16_NORMALIZE: f32 = 32768.0;

/// A decoded mono waveform
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Samples (f32, normalized to [-1.0, 1.0]), mono
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioClip {
    /// Create a clip from mono f32 samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A silent clip of the given duration
    pub fn silence(duration_ms: u64, sample_rate: u32) -> Self {
        let len = (sample_rate as u64 * duration_ms / 1000) as usize;
        Self::new(vec![0.0; len], sample_rate)
    }

    /// A sine tone of the given frequency and duration
    pub fn tone(freq_hz: f32, duration_ms: u64, sample_rate: u32) -> Self {
        let len = (sample_rate as u64 * duration_ms / 1000) as usize;
        let samples = (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (t * freq_hz * 2.0 * std::f32::consts::PI).sin() * 0.5
            })
            .collect();
        Self::new(samples, sample_rate)
    }

    /// Read a WAV file, averaging multi-channel input down to mono
    pub fn read_wav(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(Error::Audio(format!(
                "{}: zero channels",
                path.display()
            )));
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / PCM16_NORMALIZE))
                .collect::<std::result::Result<_, _>>()?,
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
        };

        let samples = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        Ok(Self::new(samples, spec.sample_rate))
    }

    /// Write the clip as 16-bit PCM mono WAV
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer.write_sample((clamped * PCM16_SCALE) as i16)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Resample to the target rate using Rubato (FFT-based).
    ///
    /// The clip is fed chunk by chunk; the tail goes through a partial
    /// process call so nothing is dropped. Falls back to linear
    /// interpolation for very short clips or when the resampler fails.
    pub fn resample(&self, target_rate: u32) -> Self {
        use rubato::{FftFixedIn, Resampler};

        if self.sample_rate == target_rate {
            return self.clone();
        }

        if self.samples.len() < 64 {
            return self.resample_linear(target_rate);
        }

        let samples_f64: Vec<f64> = self.samples.iter().map(|&s| s as f64).collect();
        let chunk_size = self.samples.len().min(1024);

        let mut resampler = match FftFixedIn::<f64>::new(
            self.sample_rate as usize,
            target_rate as usize,
            chunk_size,
            2,
            1,
        ) {
            Ok(resampler) => resampler,
            Err(e) => {
                tracing::warn!("Rubato init failed, using linear fallback: {}", e);
                return self.resample_linear(target_rate);
            }
        };

        let expected_len = (self.samples.len() as f64 * target_rate as f64
            / self.sample_rate as f64)
            .round() as usize;
        let delay = resampler.output_delay();
        let mut collected: Vec<f32> = Vec::with_capacity(delay + expected_len + chunk_size);

        let mut pos = 0;
        loop {
            let needed = resampler.input_frames_next();
            if pos + needed > samples_f64.len() {
                break;
            }
            let chunk = vec![samples_f64[pos..pos + needed].to_vec()];
            match resampler.process(&chunk, None) {
                Ok(output) => collected.extend(output[0].iter().map(|&s| s as f32)),
                Err(e) => {
                    tracing::warn!("Rubato processing failed, using linear fallback: {}", e);
                    return self.resample_linear(target_rate);
                }
            }
            pos += needed;
        }

        if pos < samples_f64.len() {
            let tail = vec![samples_f64[pos..].to_vec()];
            match resampler.process_partial(Some(&tail), None) {
                Ok(output) => collected.extend(output[0].iter().map(|&s| s as f32)),
                Err(e) => {
                    tracing::warn!("Rubato tail processing failed, using linear fallback: {}", e);
                    return self.resample_linear(target_rate);
                }
            }
        }

        // Flush the resampler's internal delay line until the trimmed
        // window (delay..delay + expected_len) is fully covered.
        while collected.len() < delay + expected_len {
            match resampler.process_partial(None::<&[Vec<f64>]>, None) {
                Ok(output) if !output[0].is_empty() => {
                    collected.extend(output[0].iter().map(|&s| s as f32));
                }
                Ok(_) => break,
                Err(e) => {
                    tracing::warn!("Rubato flush failed, using linear fallback: {}", e);
                    return self.resample_linear(target_rate);
                }
            }
        }

        let end = (delay + expected_len).min(collected.len());
        let resampled = collected[delay.min(collected.len())..end].to_vec();
        Self::new(resampled, target_rate)
    }

    /// Linear interpolation fallback for edge cases
    fn resample_linear(&self, target_rate: u32) -> Self {
        let ratio = target_rate as f64 / self.sample_rate as f64;
        let new_len = (self.samples.len() as f64 * ratio) as usize;

        let mut resampled = Vec::with_capacity(new_len);
        for i in 0..new_len {
            let src_idx = i as f64 / ratio;
            let idx_floor = src_idx.floor() as usize;
            let idx_ceil = (idx_floor + 1).min(self.samples.len().saturating_sub(1));
            let frac = (src_idx - idx_floor as f64) as f32;

            let sample = self.samples[idx_floor] * (1.0 - frac) + self.samples[idx_ceil] * frac;
            resampled.push(sample);
        }

        Self::new(resampled, target_rate)
    }

    /// Normalize to the pipeline's standard mono 16 kHz form
    pub fn to_standard(&self) -> Self {
        self.resample(TARGET_SAMPLE_RATE)
    }

    /// Append another clip, resampling it to this clip's rate first
    pub fn append(&mut self, other: &AudioClip) {
        if other.sample_rate == self.sample_rate {
            self.samples.extend_from_slice(&other.samples);
        } else {
            let resampled = other.resample(self.sample_rate);
            self.samples.extend_from_slice(&resampled.samples);
        }
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Measured duration of a WAV file in seconds, 0.0 when unreadable.
///
/// Only the header is consulted, the sample data is not decoded.
pub fn wav_duration_secs(path: &Path) -> f64 {
    match hound::WavReader::open(path) {
        Ok(reader) => {
            let spec = reader.spec();
            if spec.sample_rate == 0 {
                return 0.0;
            }
            reader.duration() as f64 / spec.sample_rate as f64
        }
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_length() {
        let clip = AudioClip::silence(150, 16_000);
        assert_eq!(clip.samples.len(), 2400);
        assert_eq!(clip.duration_ms(), 150);
    }

    #[test]
    fn test_resample_halves_length() {
        let clip = AudioClip::new(vec![0.0; 1600], 16_000);
        let resampled = clip.resample(8_000);
        // FFT resampler may pad slightly, allow a small tolerance
        assert!((resampled.samples.len() as i64 - 800).unsigned_abs() < 80);
        assert_eq!(resampled.sample_rate, 8_000);
    }

    #[test]
    fn test_wav_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");

        let clip = AudioClip::tone(300.0, 100, 16_000);
        clip.write_wav(&path).unwrap();

        let read = AudioClip::read_wav(&path).unwrap();
        assert_eq!(read.sample_rate, 16_000);
        assert_eq!(read.samples.len(), clip.samples.len());
    }

    #[test]
    fn test_wav_duration_unreadable_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.wav");
        assert_eq!(wav_duration_secs(&missing), 0.0);

        let bogus = dir.path().join("bogus.wav");
        std::fs::write(&bogus, b"not a wav").unwrap();
        assert_eq!(wav_duration_secs(&bogus), 0.0);
    }

    #[test]
    fn test_append_concatenates() {
        let mut a = AudioClip::silence(1000, 16_000);
        let b = AudioClip::silence(1000, 16_000);
        a.append(&b);
        assert_eq!(a.duration_ms(), 2000);
    }
}
