//! Structured log entries with PII redaction
//!
//! Redaction happens before storage: `LogEntry::redacted` is a pure
//! function and the log recorder only ever keeps its output.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::turn::CsAction;

/// Runs of 6 or more digits are treated as identifiers (phone numbers,
/// account numbers) and masked down to the last four digits.
static PII_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{6,})\b").unwrap());

/// Mask long digit runs, keeping only the last four digits
pub fn redact_digits(text: &str) -> String {
    PII_DIGITS
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let digits = &caps[1];
            // \d is Unicode-aware, so take the tail by chars, not bytes
            let skip = digits.chars().count().saturating_sub(4);
            let tail: String = digits.chars().skip(skip).collect();
            format!("***{tail}")
        })
        .into_owned()
}

/// Pipeline stage a log entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStage {
    ClientTts,
    Stt,
    CsDecision,
    AgentTts,
    Normalize,
}

/// One structured run-log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: DateTime<Utc>,
    pub stage: LogStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<CsAction>,
}

impl LogEntry {
    pub fn new(stage: LogStage) -> Self {
        Self {
            time: Utc::now(),
            stage,
            turn: None,
            text: None,
            transcript: None,
            audio: None,
            action: None,
        }
    }

    pub fn with_turn(mut self, turn: u32) -> Self {
        self.turn = Some(turn);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    pub fn with_audio(mut self, audio: impl Into<PathBuf>) -> Self {
        self.audio = Some(audio.into());
        self
    }

    pub fn with_action(mut self, action: CsAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Pure redaction pass over the free-text fields
    pub fn redacted(mut self) -> Self {
        self.text = self.text.map(|t| redact_digits(&t));
        self.transcript = self.transcript.map(|t| redact_digits(&t));
        self
    }
}
