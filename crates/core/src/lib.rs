//! Core traits and types for the call simulator
//!
//! This crate provides foundational types used across all other crates:
//! - Backend traits for pluggable services (STT, TTS, vocalizer, reply selector)
//! - Audio clip handling (WAV I/O, resampling)
//! - Conversation records (turns, transcripts, run metadata)
//! - Log entries with PII redaction
//! - Error types

pub mod audio;
pub mod error;
pub mod redact;
pub mod traits;
pub mod transcript;
pub mod turn;

pub use audio::AudioClip;
pub use error::{Error, Result};
pub use redact::{redact_digits, LogEntry, LogStage};
pub use traits::{ReplySelector, SttProvider, TtsOutput, TtsProvider, VocalizeProvider, Vocalized};
pub use transcript::{Speaker, SttSegment, Transcription, TranscriptEntry};
pub use turn::{CsAction, ReplyDecision, RunConfig, RunMetadata, StageErrors, TurnRecord};

/// Sample rate every synthesized and stitched artifact is normalized to.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;
