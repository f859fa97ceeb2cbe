mod sink;
mod source;

use anyhow::{Context, Result};
use clap::Parser;
use proximity_guard::{PipelineConfig, ProximityPipeline, run};
use sink::LogSink;
use source::DirectorySource;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Replays a directory of frames through the proximity monitor.
#[derive(Parser, Debug)]
#[command(name = "guard_tester", version, about)]
struct Args {
    /// Directory of image frames, processed in file-name order.
    #[arg(long)]
    frames: PathBuf,

    /// YAML configuration file. Defaults are used for any key it omits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the foreground mask of every monitored frame as PNG into this directory.
    #[arg(long)]
    mask_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set RUST_LOG to override, e.g. RUST_LOG=proximity_guard=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("proximity_guard=info,guard_tester=info")
            }),
        )
        .with_target(true)
        .init();

    let args = Args::parse();

    // --- 1. Configuration ---
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    info!(
        boundary_x = config.boundary_x,
        calibration_frames = config.calibration_frames,
        stability_frames = config.stability_frames,
        "configuration loaded"
    );

    // --- 2. Frame Source & Sink ---
    let mut pipeline = ProximityPipeline::new(config).context("invalid configuration")?;
    let mut source = DirectorySource::open(&args.frames)
        .with_context(|| format!("opening frame source {}", args.frames.display()))?;
    let mut sink = LogSink::new(args.mask_dir.clone())?;
    info!(frames = source.remaining(), "frame source ready");

    // --- 3. Stop Signal ---
    let stop = Arc::new(AtomicBool::new(false));
    let signal_stop = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current frame");
            signal_stop.store(true, Ordering::SeqCst);
        }
    });

    // --- 4. Processing Loop ---
    let summary = tokio::task::spawn_blocking(move || {
        run(&mut pipeline, &mut source, &mut sink, &stop)
    })
    .await
    .context("processing loop panicked")??;

    info!(
        frames = summary.frames_processed,
        calibration = summary.calibration_frames,
        zone_changes = summary.zone_changes,
        danger_frames = summary.danger_frames,
        final_zone = %summary.final_zone,
        stopped = summary.stopped,
        "processing complete"
    );
    Ok(())
}
