//! CLI entrypoint for the call simulator

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use callsim_agent::ScriptedClient;
use callsim_config::{load_settings, OutputLayout, TtsBackendChoice};
use callsim_runner::{build_services, run_conversation};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Run a simulated customer-service call end to end
#[derive(Debug, Parser)]
#[command(name = "callsim", version, about)]
struct Cli {
    /// Maximum number of client turns to run
    #[arg(long, default_value_t = 3)]
    turns: u32,

    /// Recognition model selector (e.g. tiny, small, openai)
    #[arg(long, default_value = "tiny")]
    stt_model: String,

    /// Synthesis backend: auto, engine or tone
    #[arg(long, default_value = "auto")]
    tts_backend: String,

    /// Use the external phonetic vocalization engine
    #[arg(long)]
    vocalizer: bool,

    /// Root directory for run artifacts
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Optional settings file (YAML or TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref()).context("loading settings")?;
    settings.turns = cli.turns;
    settings.stt.model = cli.stt_model;
    settings.tts.backend = cli
        .tts_backend
        .parse::<TtsBackendChoice>()
        .context("parsing --tts-backend")?;
    settings.vocalizer.use_engine = cli.vocalizer || settings.vocalizer.use_engine;
    if let Some(output_dir) = cli.output_dir {
        settings.output_root = output_dir;
    }
    settings.validate().context("validating settings")?;

    let layout = OutputLayout::new(&settings.output_root);
    layout.ensure_dirs().context("creating output directories")?;

    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
    init_tracing(&layout, &stamp)?;

    tracing::info!(
        "starting conversation run: turns={} stt_model={} tts_backend={} vocalizer={}",
        settings.turns,
        settings.stt.model,
        settings.tts.backend.as_str(),
        settings.vocalizer.use_engine
    );

    let services = build_services(&settings).await;
    let mut client = ScriptedClient::new();

    let outcome = run_conversation(&settings, &services, &mut client, &stamp)
        .await
        .context("conversation run failed")?;

    tracing::info!(
        "run complete: {} turns, artifacts index at {}",
        outcome.metadata.turns.len(),
        layout.artifacts_index().display()
    );
    println!("{}", serde_json::to_string_pretty(&outcome.metadata)?);

    Ok(())
}

/// Log to stderr and to the timestamped run log file
fn init_tracing(layout: &OutputLayout, stamp: &str) -> anyhow::Result<()> {
    let log_file = std::fs::File::create(layout.run_log(stamp))
        .context("creating run log file")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();

    Ok(())
}
