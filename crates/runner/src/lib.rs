//! Conversation runner
//!
//! The orchestration core of the simulator: one turn at a time, each
//! stage isolated so a failing service degrades the turn instead of
//! aborting the run, followed by artifact aggregation (transcript,
//! logs, run metadata, stitched audio, subtitles, artifact index).

pub mod artifacts;
pub mod conversation;
pub mod orchestrator;
pub mod recorders;

pub use artifacts::ArtifactIndex;
pub use conversation::{build_services, run_conversation, RunOutcome};
pub use orchestrator::{run_turn, TurnServices};
pub use recorders::{LogRecorder, TranscriptRecorder};

use thiserror::Error;

/// Runner errors
///
/// Everything here is fatal: per-stage service failures are absorbed
/// inside the turn orchestrator and never surface as a `RunnerError`.
/// What remains is configuration and artifact persistence.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("configuration error: {0}")]
    Config(#[from] callsim_config::ConfigError),

    #[error(transparent)]
    Core(#[from] callsim_core::Error),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] callsim_pipeline::PipelineError),
}
