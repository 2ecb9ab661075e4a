//! repsense - stretching repetition analyzer
//!
//! Turns a stream of camera frames into per-frame angle feedback, counted
//! repetitions and a running exercise report.
//!
//! # Usage
//!
//! ```bash
//! # Serve WebSocket sessions on /ws/analysis
//! repsense --addr 0.0.0.0:8000
//!
//! # Demo without a vision provider
//! repsense --synthetic
//!
//! # Replay JSON-lines frames, one message per line on stdout
//! repsense --replay frames.jsonl
//! cat frames.jsonl | repsense --replay -
//! ```
//!
//! # Environment Variables
//!
//! - `REPSENSE_CONFIG`: Path to the TOML configuration file
//! - `REPSENSE_ANNOTATOR_URL` / `REPSENSE_ANNOTATOR_API_KEY`: Vision provider
//! - `REPSENSE_SERVER_ADDR`: Listen address
//! - `REPSENSE_CORS_ORIGINS`: Comma-separated browser origins to allow
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

use repsense::annotator::create_annotator;
use repsense::api::{create_app, ApiState};
use repsense::config::{self, AnalyzerConfig};
use repsense::pipeline::{JsonLinesSink, JsonLinesSource, ProcessingLoop};
use repsense::session::Session;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "repsense")]
#[command(about = "Stretching repetition analyzer")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8000")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to the TOML configuration file
    #[arg(short, long, env = "REPSENSE_CONFIG")]
    config: Option<PathBuf>,

    /// Replay JSON-lines frames from a file ("-" for stdin) instead of serving
    #[arg(long, value_name = "PATH")]
    replay: Option<String>,

    /// Use the synthetic annotator regardless of configuration
    #[arg(long)]
    synthetic: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

// ============================================================================
// Modes
// ============================================================================

async fn run_server(
    config: &AnalyzerConfig,
    state: ApiState,
    cancel_token: CancellationToken,
) -> Result<()> {
    let addr = config.server.addr.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("✓ Listening on {} (WebSocket: ws://{}/ws/analysis)", addr, addr);

    // WebSocket sessions watch the same token and close themselves
    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await
        .context("HTTP server error")
}

async fn run_replay(
    path: &str,
    config: &AnalyzerConfig,
    state: &ApiState,
    cancel_token: CancellationToken,
) -> Result<()> {
    let session = Session::new(state.annotator.clone(), config);
    let processing_loop = ProcessingLoop::new(session, cancel_token);
    let mut sink = JsonLinesSink::stdout();

    let stats = if path == "-" {
        info!("Input: stdin (JSON-lines frames)");
        processing_loop.run(&mut JsonLinesSource::stdin(), &mut sink).await
    } else {
        info!("Input: {}", path);
        let mut source = JsonLinesSource::open(std::path::Path::new(path)).await?;
        processing_loop.run(&mut source, &mut sink).await
    };

    info!(
        frames = stats.frames_processed,
        failures = stats.annotation_failures,
        repetitions = stats.repetitions_completed,
        discarded = stats.repetitions_discarded,
        "Replay finished"
    );
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so replay output on stdout stays machine-readable
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let mut analyzer_config = AnalyzerConfig::load_with_path(args.config.as_deref());
    analyzer_config
        .apply_cli_overrides(args.addr, args.synthetic)
        .context("Invalid configuration after command-line overrides")?;
    info!(
        threshold = analyzer_config.segmenter.threshold,
        min_frames = analyzer_config.segmenter.min_frames,
        min_reps = analyzer_config.report.min_reps,
        annotator = %analyzer_config.annotator.backend,
        "Configuration loaded"
    );
    config::init(analyzer_config);
    let analyzer_config = config::get();

    let annotator =
        create_annotator(&analyzer_config.annotator).context("Failed to create annotator")?;

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown");
        shutdown_token.cancel();
    });

    let state = ApiState::new(annotator, analyzer_config.clone(), cancel_token.clone());

    match args.replay.as_deref() {
        Some(path) => run_replay(path, analyzer_config, &state, cancel_token).await?,
        None => run_server(analyzer_config, state, cancel_token).await?,
    }

    info!("✓ repsense shutdown complete");
    Ok(())
}
