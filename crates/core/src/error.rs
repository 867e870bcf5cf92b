//! Error types shared across the workspace

use thiserror::Error;

/// Workspace-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Audio error: {0}")]
    Audio(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Speech recognition error: {0}")]
    Recognition(String),

    #[error("Vocalization error: {0}")]
    Vocalize(String),

    #[error("Reply selection error: {0}")]
    Reply(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
