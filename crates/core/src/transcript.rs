//! Transcription results and conversation transcript entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One time-stamped recognized segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SttSegment {
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
    /// Recognized text
    pub text: String,
}

impl SttSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Recognition result
///
/// Always fully populated: when the underlying engine is unavailable the
/// recognizer degrades to a single mock segment spanning the measured
/// duration of the input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Full recognized text
    pub text: String,
    /// Time-stamped segments, ordered
    pub segments: Vec<SttSegment>,
    /// Detected or hinted language code ("und" when unknown)
    pub language: String,
}

impl Transcription {
    /// Build from segments, joining their text
    pub fn from_segments(segments: Vec<SttSegment>, language: impl Into<String>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            segments,
            language: language.into(),
        }
    }

    /// True when no usable text was recognized
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Side of the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Client,
    Agent,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Client => "client",
            Speaker::Agent => "agent",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of the persisted conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// When the line was spoken
    pub time: DateTime<Utc>,
    /// Who spoke it
    pub speaker: Speaker,
    /// What was said
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            speaker,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_segments_joins_text() {
        let t = Transcription::from_segments(
            vec![
                SttSegment::new(0.0, 1.0, "שלום"),
                SttSegment::new(1.0, 2.0, " עולם "),
            ],
            "he",
        );
        assert_eq!(t.text, "שלום עולם");
        assert_eq!(t.segments.len(), 2);
        assert!(!t.is_empty());
    }

    #[test]
    fn test_empty_transcription() {
        let t = Transcription::from_segments(vec![SttSegment::new(0.0, 1.0, "  ")], "und");
        assert!(t.is_empty());
    }

    #[test]
    fn test_speaker_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Speaker::Client).unwrap(), "\"client\"");
        assert_eq!(serde_json::to_string(&Speaker::Agent).unwrap(), "\"agent\"");
    }
}
