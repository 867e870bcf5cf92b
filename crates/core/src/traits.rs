//! Backend traits
//!
//! Recognition, synthesis, vocalization and reply selection are external
//! collaborators with narrow contracts. Each gets a provider trait here;
//! the pipeline crate layers ranked fallback facades on top, so a missing
//! or broken engine degrades a stage instead of aborting a turn.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transcript::Transcription;
use crate::turn::ReplyDecision;

/// Speech-to-text provider
///
/// # Example
///
/// ```ignore
/// let stt: Box<dyn SttProvider> = Box::new(HttpSttProvider::new(config)?);
/// let transcription = stt.transcribe(&wav_path, Some("he")).await?;
/// println!("Recognized: {}", transcription.text);
/// ```
#[async_trait]
pub trait SttProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Cheap availability probe, called once at initialization
    async fn is_available(&self) -> bool;

    /// Transcribe a WAV file
    async fn transcribe(&self, audio: &Path, language: Option<&str>) -> Result<Transcription>;
}

/// Result of one synthesis call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsOutput {
    /// Path of the produced WAV file
    pub path: PathBuf,
    /// Duration of the produced audio
    pub duration_ms: u64,
    /// Always 16000 for this pipeline
    pub sample_rate: u32,
}

/// Text-to-speech provider
///
/// Implementations must produce a playable mono 16 kHz WAV at `out_path`.
#[async_trait]
pub trait TtsProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Synthesize `text` into a WAV file at `out_path`
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<TtsOutput>;
}

/// Vocalization result: annotated text plus an optional phoneme hint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocalized {
    /// Phonetically annotated (or best-effort) text
    pub vocalized: String,
    /// Phoneme string, preferred by synthesis when non-empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonemes: Option<String>,
}

impl Vocalized {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            vocalized: text.into(),
            phonemes: None,
        }
    }
}

/// Text vocalization provider (diacritization / phonetic lookup)
pub trait VocalizeProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Annotate raw text for synthesis
    fn vocalize(&self, text: &str) -> Result<Vocalized>;
}

/// Reply selection seam
#[async_trait]
pub trait ReplySelector: Send + Sync {
    /// Decide how to answer the given user text
    async fn decide(&self, user_text: &str) -> Result<ReplyDecision>;
}
