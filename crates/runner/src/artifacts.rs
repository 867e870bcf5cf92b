//! Final artifact index
//!
//! Maps logical artifact names to the files a run produced. Absent
//! artifacts are recorded as explicit nulls so consumers can tell
//! "not produced" apart from "index missing the key".

use std::path::{Path, PathBuf};

use callsim_core::Result;
use serde::{Deserialize, Serialize};

/// Logical-name -> path index written at the end of every run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactIndex {
    pub transcript_json: Option<PathBuf>,
    pub logs: Option<PathBuf>,
    pub run_meta: Option<PathBuf>,
    pub stitched_audio: Option<PathBuf>,
    pub srt: Option<PathBuf>,
}

impl ArtifactIndex {
    /// Persist as pretty-printed JSON; write errors propagate
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("artifacts index saved: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_artifacts_serialize_as_null() {
        let index = ArtifactIndex {
            transcript_json: Some(PathBuf::from("t.json")),
            logs: Some(PathBuf::from("l.json")),
            run_meta: Some(PathBuf::from("m.json")),
            stitched_audio: None,
            srt: None,
        };
        let json = serde_json::to_value(&index).unwrap();
        assert!(json["stitched_audio"].is_null());
        assert!(json["srt"].is_null());
        assert_eq!(json["transcript_json"], "t.json");
    }

    #[test]
    fn test_write_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifacts_index.json");

        let index = ArtifactIndex {
            stitched_audio: Some(PathBuf::from("audio/full.wav")),
            ..Default::default()
        };
        index.write(&path).unwrap();

        let back: ArtifactIndex =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.stitched_audio, Some(PathBuf::from("audio/full.wav")));
        assert!(back.srt.is_none());
    }
}
