//! Speech synthesis
//!
//! Providers form an explicit ranked chain fixed at construction: the
//! HTTP engine sidecar when configured, then a fixed-tone placeholder
//! scaled by word count, so downstream stages always get a file unless
//! even the placeholder cannot be written. Output is always mono 16 kHz
//! WAV.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use callsim_config::{TtsBackendChoice, TtsSettings};
use callsim_core::{AudioClip, TtsOutput, TtsProvider, TARGET_SAMPLE_RATE};
use serde::Serialize;

use crate::PipelineError;

const ENGINE_TIMEOUT: Duration = Duration::from_secs(30);

/// Head tone of the placeholder clip
const TONE_FREQ_HZ: f32 = 300.0;
const TONE_HEAD_MS: u64 = 300;
/// Placeholder length scales with the word count of the input
const TONE_MS_PER_WORD: u64 = 200;

/// HTTP TTS engine sidecar: POST text, WAV bytes back
pub struct HttpTtsProvider {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
}

impl HttpTtsProvider {
    pub fn new(url: impl Into<String>) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(ENGINE_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Engine(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn fetch_wav(&self, text: &str) -> Result<Vec<u8>, PipelineError> {
        let response = self
            .client
            .post(format!("{}/synthesize", self.url))
            .json(&SynthesizeRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Engine(format!(
                "TTS engine returned {status}: {body}"
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Decode engine bytes and normalize to the pipeline standard
    fn decode_wav(bytes: &[u8]) -> Result<AudioClip, PipelineError> {
        let cursor = std::io::Cursor::new(bytes);
        let mut reader = hound::WavReader::new(cursor)
            .map_err(|e| PipelineError::Engine(format!("engine sent non-WAV data: {e}")))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<Result<_, _>>()
                .map_err(|e| PipelineError::Engine(e.to_string()))?,
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| PipelineError::Engine(e.to_string()))?,
        };

        let mono: Vec<f32> = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        Ok(AudioClip::new(mono, spec.sample_rate).to_standard())
    }
}

#[async_trait]
impl TtsProvider for HttpTtsProvider {
    fn name(&self) -> &str {
        "http-engine"
    }

    async fn synthesize(&self, text: &str, out_path: &Path) -> callsim_core::Result<TtsOutput> {
        let bytes = self
            .fetch_wav(text)
            .await
            .map_err(|e| callsim_core::Error::Synthesis(e.to_string()))?;
        let clip = Self::decode_wav(&bytes)
            .map_err(|e| callsim_core::Error::Synthesis(e.to_string()))?;
        clip.write_wav(out_path)?;

        Ok(TtsOutput {
            path: out_path.to_path_buf(),
            duration_ms: clip.duration_ms(),
            sample_rate: TARGET_SAMPLE_RATE,
        })
    }
}

/// Placeholder provider: a short tone followed by silence per word
pub struct ToneTtsProvider;

impl ToneTtsProvider {
    fn placeholder_clip(text: &str) -> AudioClip {
        let words = text.split_whitespace().count().max(1) as u64;
        let mut clip = AudioClip::tone(TONE_FREQ_HZ, TONE_HEAD_MS, TARGET_SAMPLE_RATE);
        clip.append(&AudioClip::silence(
            TONE_MS_PER_WORD * words,
            TARGET_SAMPLE_RATE,
        ));
        clip
    }
}

#[async_trait]
impl TtsProvider for ToneTtsProvider {
    fn name(&self) -> &str {
        "tone"
    }

    async fn synthesize(&self, text: &str, out_path: &Path) -> callsim_core::Result<TtsOutput> {
        let clip = Self::placeholder_clip(text);
        clip.write_wav(out_path)?;
        Ok(TtsOutput {
            path: out_path.to_path_buf(),
            duration_ms: clip.duration_ms(),
            sample_rate: TARGET_SAMPLE_RATE,
        })
    }
}

/// Synthesis facade over the ranked provider chain
///
/// Prefers the phoneme hint over plain text when one is present. The
/// first provider to succeed wins; the last error surfaces only when
/// every provider failed.
pub struct SpeechSynthesizer {
    providers: Vec<Box<dyn TtsProvider>>,
}

impl SpeechSynthesizer {
    /// Build the chain from settings: engine first when configured,
    /// tone placeholder last
    pub fn new(settings: &TtsSettings) -> Self {
        let mut providers: Vec<Box<dyn TtsProvider>> = Vec::new();

        match settings.backend {
            TtsBackendChoice::Tone => {}
            TtsBackendChoice::Auto | TtsBackendChoice::Engine => {
                match settings.engine_url.as_deref() {
                    Some(url) => match HttpTtsProvider::new(url) {
                        Ok(provider) => providers.push(Box::new(provider)),
                        Err(e) => {
                            tracing::warn!("TTS engine unusable, tone fallback only: {e}");
                        }
                    },
                    None if settings.backend == TtsBackendChoice::Engine => {
                        tracing::warn!(
                            "tts.backend=engine but no engine_url configured; using tone fallback"
                        );
                    }
                    None => {}
                }
            }
        }

        providers.push(Box::new(ToneTtsProvider));
        Self { providers }
    }

    /// Tone-only synthesizer
    pub fn tone_only() -> Self {
        Self {
            providers: vec![Box::new(ToneTtsProvider)],
        }
    }

    /// Synthesizer with an explicit chain (tests)
    pub fn with_providers(providers: Vec<Box<dyn TtsProvider>>) -> Self {
        Self { providers }
    }

    /// Synthesize to `out_path`, preferring the phoneme hint when non-empty
    pub async fn synthesize(
        &self,
        text: &str,
        phonemes: Option<&str>,
        out_path: &Path,
    ) -> callsim_core::Result<TtsOutput> {
        let input = match phonemes {
            Some(p) if !p.trim().is_empty() => p,
            _ => text,
        };

        let mut last_error = None;
        for provider in &self.providers {
            match provider.synthesize(input, out_path).await {
                Ok(output) => return Ok(output),
                Err(e) => {
                    tracing::warn!(provider = provider.name(), "synthesis failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            callsim_core::Error::Synthesis("no synthesis providers configured".to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsim_core::Error;

    struct FailingEngine;

    #[async_trait]
    impl TtsProvider for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        async fn synthesize(&self, _text: &str, _out: &Path) -> callsim_core::Result<TtsOutput> {
            Err(Error::Synthesis("engine down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_tone_placeholder_scales_with_words() {
        let dir = tempfile::tempdir().unwrap();
        let synth = SpeechSynthesizer::tone_only();

        let short = synth
            .synthesize("מילה", None, &dir.path().join("short.wav"))
            .await
            .unwrap();
        let long = synth
            .synthesize("אחת שתיים שלוש ארבע", None, &dir.path().join("long.wav"))
            .await
            .unwrap();

        assert_eq!(short.sample_rate, 16_000);
        assert_eq!(short.duration_ms, 300 + 200);
        assert_eq!(long.duration_ms, 300 + 200 * 4);
    }

    #[tokio::test]
    async fn test_engine_failure_degrades_to_tone() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("degraded.wav");
        let synth = SpeechSynthesizer::with_providers(vec![
            Box::new(FailingEngine),
            Box::new(ToneTtsProvider),
        ]);

        let output = synth.synthesize("שלום", None, &out).await.unwrap();
        assert!(out.exists());
        assert_eq!(output.sample_rate, 16_000);
    }

    #[tokio::test]
    async fn test_all_providers_failing_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let synth = SpeechSynthesizer::with_providers(vec![Box::new(FailingEngine)]);
        let result = synth
            .synthesize("שלום", None, &dir.path().join("none.wav"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_phoneme_hint_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let synth = SpeechSynthesizer::tone_only();

        // Placeholder scales by word count, so the hint's word count wins.
        let out = synth
            .synthesize("מילה", Some("pho neme hint"), &dir.path().join("hint.wav"))
            .await
            .unwrap();
        assert_eq!(out.duration_ms, 300 + 200 * 3);
    }

    #[tokio::test]
    async fn test_blank_phoneme_hint_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let synth = SpeechSynthesizer::tone_only();

        let out = synth
            .synthesize("מילה אחת", Some("  "), &dir.path().join("blank.wav"))
            .await
            .unwrap();
        assert_eq!(out.duration_ms, 300 + 200 * 2);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(HttpTtsProvider::decode_wav(b"definitely not wav").is_err());
    }
}
