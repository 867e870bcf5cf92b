//! Chat backend for the generative reply path
//!
//! One OpenAI-compatible chat completions client behind a small trait.
//! The reply selector treats any error here (auth, quota, network, parse)
//! as a signal to fall back to its rule table, so nothing in this crate
//! retries or degrades on its own.

pub mod backend;

pub use backend::{ChatBackend, GenerationResult, LlmConfig, Message, OpenAiChatBackend, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}
