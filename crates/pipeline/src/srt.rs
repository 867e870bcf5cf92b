//! SubRip (SRT) export for recognized segments

use std::path::Path;

use callsim_core::SttSegment;

use crate::PipelineError;

/// Format seconds as `HH:MM:SS,mmm`
fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    let millis = ((seconds - total_seconds as f64) * 1000.0) as u64;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// Render segments as numbered SRT blocks.
///
/// Deterministic: the same segment list always renders to identical bytes.
pub fn render_srt(segments: &[SttSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        let text = segment.text.replace('\n', " ");
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(segment.start),
            format_timestamp(segment.end),
            text.trim()
        ));
    }
    out
}

/// Render and write an SRT file
pub fn write_srt(segments: &[SttSegment], out_path: &Path) -> Result<(), PipelineError> {
    std::fs::write(out_path, render_srt(segments))?;
    tracing::info!("wrote SRT: {}", out_path.display());
    Ok(())
}
