//! Per-turn records and run metadata

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transcript::SttSegment;

/// Customer-service action attached to a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsAction {
    /// Ask the caller to confirm identity or contact details
    Verify,
    /// Explain policy or next steps
    Explain,
    /// Confirm that a request was carried out
    Confirm,
    /// End the conversation
    Close,
    /// Ask the caller to try again after a failure
    Retry,
}

impl CsAction {
    /// Whether this action terminates the conversation loop
    pub fn is_closing(&self) -> bool {
        matches!(self, CsAction::Close)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CsAction::Verify => "verify",
            CsAction::Explain => "explain",
            CsAction::Confirm => "confirm",
            CsAction::Close => "close",
            CsAction::Retry => "retry",
        }
    }
}

impl std::fmt::Display for CsAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reply selector output: what to say and what it means for the flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyDecision {
    pub reply: String,
    pub action: CsAction,
}

impl ReplyDecision {
    pub fn new(reply: impl Into<String>, action: CsAction) -> Self {
        Self {
            reply: reply.into(),
            action,
        }
    }
}

/// Per-stage failure messages for one turn
///
/// A populated field means the stage failed and its deterministic fallback
/// was substituted; the turn itself still completed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_tts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_tts: Option<String>,
}

impl StageErrors {
    pub fn is_empty(&self) -> bool {
        self.client_tts.is_none()
            && self.normalize.is_none()
            && self.stt.is_none()
            && self.reply.is_none()
            && self.agent_tts.is_none()
    }
}

/// Record of one client->agent exchange
///
/// Created once per turn by the orchestrator; immutable once appended to
/// the run's turn list. Optional fields are absent when the producing
/// stage failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    /// 0-based, strictly increasing and contiguous within a run
    pub turn_index: u32,
    /// Scripted client utterance that started the turn
    pub client_text: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_audio: Option<PathBuf>,
    /// Duration of the synthesized client audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_tts_duration_ms: Option<u64>,
    /// Wall-clock time the synthesis call took
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_tts_elapsed_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stt_segments: Vec<SttSegment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cs_action: Option<CsAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_audio: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_tts_duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_tts_elapsed_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "StageErrors::is_empty")]
    pub errors: StageErrors,
}

impl TurnRecord {
    /// Start a record for the given turn
    pub fn begin(turn_index: u32, client_text: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            turn_index,
            client_text: client_text.into(),
            started_at: now,
            finished_at: now,
            client_audio: None,
            client_tts_duration_ms: None,
            client_tts_elapsed_ms: None,
            stt_text: None,
            stt_segments: Vec::new(),
            cs_action: None,
            reply_text: None,
            agent_audio: None,
            agent_tts_duration_ms: None,
            agent_tts_elapsed_ms: None,
            errors: StageErrors::default(),
        }
    }

    /// Stamp the turn as finished
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }
}

/// Backend choices recorded into run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub max_turns: u32,
    pub stt_model: String,
    pub tts_backend: String,
    pub use_vocalizer: bool,
}

/// Metadata for one complete run, persisted once at the end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub config: RunConfig,
    pub turns: Vec<TurnRecord>,
}

impl RunMetadata {
    pub fn new(config: RunConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            config,
            turns: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
