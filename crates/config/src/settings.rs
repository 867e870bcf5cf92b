//! Main settings module

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Synthesis backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TtsBackendChoice {
    /// Try the configured engine, fall back to the tone generator
    #[default]
    Auto,
    /// Engine only (still degrades to the tone placeholder on call failure)
    Engine,
    /// Tone generator only
    Tone,
}

impl TtsBackendChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsBackendChoice::Auto => "auto",
            TtsBackendChoice::Engine => "engine",
            TtsBackendChoice::Tone => "tone",
        }
    }
}

impl std::str::FromStr for TtsBackendChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(TtsBackendChoice::Auto),
            "engine" => Ok(TtsBackendChoice::Engine),
            "tone" | "mock" => Ok(TtsBackendChoice::Tone),
            other => Err(ConfigError::InvalidValue {
                field: "tts.backend".to_string(),
                message: format!("unknown backend '{other}' (expected auto|engine|tone)"),
            }),
        }
    }
}

/// Speech recognition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttSettings {
    /// Model selector; "openai" routes to the hosted transcription API
    #[serde(default = "default_stt_model")]
    pub model: String,

    /// Skip every engine and run the deterministic mock
    #[serde(default = "default_stt_force_mock")]
    pub force_mock: bool,

    /// Optional STT sidecar service base URL
    #[serde(default)]
    pub sidecar_url: Option<String>,

    /// Language hint passed to the engine
    #[serde(default)]
    pub language: Option<String>,

    /// API key for the hosted transcription backend; defaults to OPENAI_API_KEY
    #[serde(default = "default_stt_api_key")]
    pub api_key: Option<String>,
}

fn default_stt_model() -> String {
    "tiny".to_string()
}

fn default_stt_force_mock() -> bool {
    env_flag("CALLSIM_STT_FORCE_MOCK")
}

fn default_stt_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
}

impl Default for SttSettings {
    fn default() -> Self {
        Self {
            model: default_stt_model(),
            force_mock: default_stt_force_mock(),
            sidecar_url: None,
            language: None,
            api_key: default_stt_api_key(),
        }
    }
}

/// Speech synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TtsSettings {
    #[serde(default)]
    pub backend: TtsBackendChoice,

    /// Optional TTS engine base URL (POST text, WAV bytes back)
    #[serde(default)]
    pub engine_url: Option<String>,
}

/// Vocalization settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VocalizerSettings {
    /// Use the external phonetic engine when a CLI path is configured
    #[serde(default)]
    pub use_engine: bool,

    /// Path to the phonetic engine executable
    #[serde(default)]
    pub cli_path: Option<String>,
}

/// Reply selection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    /// Try the generative backend before the rule table
    #[serde(default = "default_reply_generative")]
    pub generative: bool,

    /// Chat model for the generative path
    #[serde(default = "default_reply_model")]
    pub model: String,

    /// Chat completions endpoint
    #[serde(default = "default_reply_endpoint")]
    pub endpoint: String,

    /// API key; defaults to OPENAI_API_KEY
    #[serde(default = "default_reply_api_key")]
    pub api_key: Option<String>,
}

fn default_reply_generative() -> bool {
    env_flag("CALLSIM_REPLY_GENERATIVE")
}

fn default_reply_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_reply_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_reply_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            generative: default_reply_generative(),
            model: default_reply_model(),
            endpoint: default_reply_endpoint(),
            api_key: default_reply_api_key(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Maximum number of client turns per run
    #[serde(default = "default_turns")]
    pub turns: u32,

    /// Root directory artifacts are written under
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    #[serde(default)]
    pub stt: SttSettings,

    #[serde(default)]
    pub tts: TtsSettings,

    #[serde(default)]
    pub vocalizer: VocalizerSettings,

    #[serde(default)]
    pub reply: ReplyConfig,
}

fn default_turns() -> u32 {
    3
}

fn default_output_root() -> PathBuf {
    PathBuf::from("outputs")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            turns: default_turns(),
            output_root: default_output_root(),
            stt: SttSettings::default(),
            tts: TtsSettings::default(),
            vocalizer: VocalizerSettings::default(),
            reply: ReplyConfig::default(),
        }
    }
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.turns == 0 {
            return Err(ConfigError::InvalidValue {
                field: "turns".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.stt.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "stt.model".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Load settings from an optional file plus CALLSIM_ environment overrides
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        builder = builder.add_source(File::from(path.to_path_buf()));
    }

    let config = builder
        .add_source(
            Environment::with_prefix("CALLSIM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
