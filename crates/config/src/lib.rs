//! Configuration management for the call simulator
//!
//! Supports loading configuration from:
//! - an optional YAML/TOML settings file
//! - environment variables (CALLSIM_ prefix, `__` section separator)
//! - CLI overrides applied by the runner binary

pub mod output;
pub mod settings;

pub use output::OutputLayout;
pub use settings::{
    load_settings, ReplyConfig, Settings, SttSettings, TtsBackendChoice, TtsSettings,
    VocalizerSettings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
