//! Transcript and log recorders
//!
//! Both are append-only in-memory lists owned by the conversation runner
//! and flushed once at run end. Log entries are redacted before storage,
//! so nothing unredacted ever sits in memory longer than one call.

use std::path::Path;

use callsim_core::{LogEntry, Result, Speaker, TranscriptEntry};

/// Collects both sides of the conversation
#[derive(Debug, Default)]
pub struct TranscriptRecorder {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one spoken line
    pub fn add(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(TranscriptEntry::new(speaker, text));
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Persist as pretty-printed JSON; write errors propagate
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)?;
        tracing::info!("saved transcript json: {}", path.display());
        Ok(())
    }
}

/// Collects structured run-log entries
#[derive(Debug, Default)]
pub struct LogRecorder {
    entries: Vec<LogEntry>,
}

impl LogRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, redacting its free-text fields first
    pub fn log(&mut self, entry: LogEntry) {
        self.entries.push(entry.redacted());
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Persist as pretty-printed JSON; write errors propagate
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)?;
        tracing::info!("saved logs: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsim_core::LogStage;

    #[test]
    fn test_transcript_order_preserved() {
        let mut recorder = TranscriptRecorder::new();
        recorder.add(Speaker::Client, "שלום");
        recorder.add(Speaker::Agent, "שלום, במה אפשר לעזור?");

        let entries = recorder.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].speaker, Speaker::Client);
        assert_eq!(entries[1].speaker, Speaker::Agent);
    }

    #[test]
    fn test_log_entries_are_stored_redacted() {
        let mut recorder = LogRecorder::new();
        recorder.log(
            LogEntry::new(LogStage::Stt)
                .with_turn(0)
                .with_transcript("תעודת זהות 123456789"),
        );

        let stored = &recorder.entries()[0];
        assert_eq!(stored.transcript.as_deref(), Some("תעודת זהות ***6789"));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.json");

        let mut recorder = TranscriptRecorder::new();
        recorder.add(Speaker::Client, "בדיקה");
        recorder.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let back: Vec<TranscriptEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].text, "בדיקה");
    }

    #[test]
    fn test_save_to_missing_dir_fails() {
        let recorder = LogRecorder::new();
        let result = recorder.save(Path::new("/no/such/dir/logs.json"));
        assert!(result.is_err());
    }
}
