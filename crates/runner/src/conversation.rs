//! Conversation loop and artifact aggregation

use std::path::PathBuf;

use callsim_agent::{CustomerService, ScriptedClient, Supervisor};
use callsim_config::{OutputLayout, Settings};
use callsim_core::{RunConfig, RunMetadata, SttSegment};
use callsim_pipeline::{
    stitch_wavs, write_srt, SpeechRecognizer, SpeechSynthesizer, Vocalizer,
};

use crate::orchestrator::{run_turn, TurnServices};
use crate::recorders::{LogRecorder, TranscriptRecorder};
use crate::{ArtifactIndex, RunnerError};

/// Everything a finished run hands back to the caller
#[derive(Debug)]
pub struct RunOutcome {
    pub metadata: RunMetadata,
    pub artifacts: ArtifactIndex,
}

/// Assemble the service bundle from settings
pub async fn build_services(settings: &Settings) -> TurnServices {
    TurnServices {
        vocalizer: Vocalizer::new(
            settings.vocalizer.use_engine,
            settings.vocalizer.cli_path.as_deref(),
        ),
        synthesizer: SpeechSynthesizer::new(&settings.tts),
        recognizer: SpeechRecognizer::new(&settings.stt).await,
        selector: Box::new(CustomerService::new(&settings.reply)),
    }
}

/// Drive a whole conversation and aggregate its artifacts.
///
/// The loop continues while the supervisor allows a new turn, the client
/// still has scripted utterances, and the previous reply was not a
/// closing action. A stage failure inside a turn never ends the run;
/// persistence failures after the loop do.
pub async fn run_conversation(
    settings: &Settings,
    services: &TurnServices,
    client: &mut ScriptedClient,
    stamp: &str,
) -> Result<RunOutcome, RunnerError> {
    let layout = OutputLayout::new(&settings.output_root);
    layout.ensure_dirs()?;

    let mut metadata = RunMetadata::new(RunConfig {
        max_turns: settings.turns,
        stt_model: settings.stt.model.clone(),
        tts_backend: settings.tts.backend.as_str().to_string(),
        use_vocalizer: settings.vocalizer.use_engine,
    });

    let supervisor = Supervisor::new(settings.turns);
    let mut transcript = TranscriptRecorder::new();
    let mut log = LogRecorder::new();
    let mut audio_paths: Vec<PathBuf> = Vec::new();

    let mut turn: u32 = 0;
    loop {
        if !supervisor.allow_new_turn(turn) {
            tracing::info!("supervisor prevented new turn: {turn}");
            break;
        }

        let Some(client_text) = client.next_utterance() else {
            tracing::info!("client finished scripted utterances at turn {turn}");
            break;
        };

        let record = run_turn(turn, &client_text, services, &layout, &mut transcript, &mut log).await;

        if let Some(path) = &record.client_audio {
            audio_paths.push(path.clone());
        }
        if let Some(path) = &record.agent_audio {
            audio_paths.push(path.clone());
        }

        let closing = record.cs_action.map(|a| a.is_closing()).unwrap_or(false);
        metadata.turns.push(record);

        if closing {
            tracing::info!("agent requested conversation close at turn {turn}");
            break;
        }

        turn += 1;
    }

    metadata.finish();

    // Persist transcript and run metadata
    let transcript_path = layout.transcript_json(stamp);
    transcript.save(&transcript_path)?;

    let run_meta_path = layout.run_meta_json(stamp);
    let json = serde_json::to_string_pretty(&metadata).map_err(callsim_core::Error::from)?;
    std::fs::write(&run_meta_path, json).map_err(callsim_core::Error::from)?;
    tracing::info!("saved run metadata: {}", run_meta_path.display());

    // Flush accumulated log entries
    let logs_path = layout.logs_json(stamp);
    log.save(&logs_path)?;

    // Stitch per-turn audio, in turn order, into one conversation file
    let stitched = stitch_wavs(&audio_paths, &layout.stitched_wav(stamp))?;

    // Export subtitles when any turn produced timed segments
    let segments: Vec<SttSegment> = metadata
        .turns
        .iter()
        .flat_map(|t| t.stt_segments.iter().cloned())
        .collect();
    let srt_path = if segments.is_empty() {
        None
    } else {
        let path = layout.srt(stamp);
        write_srt(&segments, &path)?;
        Some(path)
    };

    let artifacts = ArtifactIndex {
        transcript_json: Some(transcript_path),
        logs: Some(logs_path),
        run_meta: Some(run_meta_path),
        stitched_audio: stitched,
        srt: srt_path,
    };
    artifacts.write(&layout.artifacts_index())?;

    Ok(RunOutcome {
        metadata,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_stops_when_script_exhausts() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            turns: 5,
            output_root: dir.path().join("out"),
            ..Default::default()
        };
        let services = TurnServices {
            vocalizer: Vocalizer::mock(),
            synthesizer: SpeechSynthesizer::tone_only(),
            recognizer: SpeechRecognizer::mock(),
            selector: Box::new(CustomerService::rules_only()),
        };
        let mut client = ScriptedClient::with_script(vec!["שלום".into()]);

        let outcome = run_conversation(&settings, &services, &mut client, "test_stamp")
            .await
            .unwrap();
        assert_eq!(outcome.metadata.turns.len(), 1);
        assert_eq!(outcome.metadata.config.max_turns, 5);
        assert!(outcome.metadata.finished_at.is_some());
    }
}
