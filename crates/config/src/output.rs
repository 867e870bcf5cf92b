//! Output directory layout
//!
//! All artifact paths hang off one explicit root passed into the runner;
//! nothing in the pipeline touches process-global state. Directories are
//! created once at run start by `ensure_dirs`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Resolved artifact directories for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub audio: PathBuf,
    pub transcripts: PathBuf,
    pub logs: PathBuf,
    pub metadata: PathBuf,
}

impl OutputLayout {
    /// Derive the layout from a root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            audio: root.join("audio"),
            transcripts: root.join("transcripts"),
            logs: root.join("logs"),
            metadata: root.join("metadata"),
            root,
        }
    }

    /// Create every directory, erroring on the first failure.
    ///
    /// Idempotent: existing directories are left untouched.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        for dir in [
            &self.root,
            &self.audio,
            &self.transcripts,
            &self.logs,
            &self.metadata,
        ] {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::OutputDir {
                path: dir.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Per-turn client-side WAV path, unique by index and role
    pub fn client_wav(&self, turn_index: u32) -> PathBuf {
        self.audio.join(format!("client_{turn_index}.wav"))
    }

    /// Per-turn agent-side WAV path, unique by index and role
    pub fn agent_wav(&self, turn_index: u32) -> PathBuf {
        self.audio.join(format!("agent_{turn_index}.wav"))
    }

    /// Stitched whole-conversation WAV path
    pub fn stitched_wav(&self, stamp: &str) -> PathBuf {
        self.audio.join(format!("full_conversation_{stamp}.wav"))
    }

    pub fn transcript_json(&self, stamp: &str) -> PathBuf {
        self.transcripts.join(format!("transcript_{stamp}.json"))
    }

    pub fn srt(&self, stamp: &str) -> PathBuf {
        self.transcripts.join(format!("transcript_{stamp}.srt"))
    }

    pub fn run_log(&self, stamp: &str) -> PathBuf {
        self.logs.join(format!("run_{stamp}.log"))
    }

    pub fn logs_json(&self, stamp: &str) -> PathBuf {
        self.logs.join(format!("logs_{stamp}.json"))
    }

    pub fn run_meta_json(&self, stamp: &str) -> PathBuf {
        self.metadata.join(format!("run_meta_{stamp}.json"))
    }

    pub fn artifacts_index(&self) -> PathBuf {
        self.metadata.join("artifacts_index.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new("outputs");
        assert_eq!(layout.client_wav(0), PathBuf::from("outputs/audio/client_0.wav"));
        assert_eq!(layout.agent_wav(7), PathBuf::from("outputs/audio/agent_7.wav"));
        assert_eq!(
            layout.run_meta_json("20250101_120000"),
            PathBuf::from("outputs/metadata/run_meta_20250101_120000.json")
        );
    }

    #[test]
    fn test_ensure_dirs_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"));
        layout.ensure_dirs().unwrap();
        layout.ensure_dirs().unwrap();
        assert!(layout.audio.is_dir());
        assert!(layout.metadata.is_dir());
    }
}
