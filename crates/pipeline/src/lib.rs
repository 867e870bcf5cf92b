//! Speech pipeline adapters
//!
//! Thin facades over external speech services, each with a deterministic
//! in-process fallback so a missing engine never aborts a turn:
//! - [`Vocalizer`]: phonetic annotation with a best-effort mock
//! - [`SpeechSynthesizer`]: engine TTS with a tone-placeholder fallback
//! - [`SpeechRecognizer`]: ranked STT providers with a mock degrade
//!
//! Plus the audio helpers the conversation runner needs: mono/16k
//! normalization, turn-order stitching and SRT export.

pub mod normalize;
pub mod srt;
pub mod stitch;
pub mod stt;
pub mod tts;
pub mod vocalize;

pub use normalize::ensure_wav_mono_16k;
pub use srt::{render_srt, write_srt};
pub use stitch::{stitch_wavs, STITCH_GAP_MS};
pub use stt::{RecognitionOutcome, SpeechRecognizer};
pub use tts::SpeechSynthesizer;
pub use vocalize::Vocalizer;

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Network(err.to_string())
    }
}

impl From<callsim_core::Error> for PipelineError {
    fn from(err: callsim_core::Error) -> Self {
        PipelineError::Audio(err.to_string())
    }
}
