//! Headless driver for the data source display.
//!
//! Run with: cargo run -p display-harness
//!
//! Examples:
//!   cargo run -p display-harness -- --entities 500 --frames 30
//!   cargo run -p display-harness -- --scene scene.json --query sat_alpha --allow-partial

mod runner;
mod scenario;

use clap::Parser;
use display::{ConfigError, DisplayConfig, DisplayError, SceneRecorder};
use scene_events::{EntityId, JulianDate};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use runner::RunOptions;
use scenario::SceneLoadError;

/// Headless data source display harness
#[derive(Parser, Debug)]
#[command(name = "display-harness")]
#[command(about = "Drives a data source display frame by frame and reports readiness")]
struct Args {
    /// Display configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene description file (JSON); a random scene is generated if omitted
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Number of frames to run
    #[arg(long, default_value_t = 10)]
    frames: u64,

    /// Random seed for the generated scene
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of entities in the generated scene
    #[arg(long, default_value_t = 100)]
    entities: usize,

    /// Start time, e.g. jd_2451545+43200; defaults to the scene's start
    #[arg(long)]
    start: Option<JulianDate>,

    /// Simulated seconds between frames
    #[arg(long, default_value_t = 1.0)]
    step_seconds: f64,

    /// Entity whose bounding sphere is polled each frame
    #[arg(long)]
    query: Option<String>,

    /// Merge whatever bounding spheres are available instead of waiting
    #[arg(long)]
    allow_partial: bool,

    /// Frames to run before terrain heights are initialized
    #[arg(long, default_value_t = 0)]
    terrain_delay: u64,
}

#[derive(Debug, Error)]
enum HarnessError {
    #[error(transparent)]
    Scene(#[from] SceneLoadError),
    #[error("failed to load config: {0}")]
    Config(#[from] ConfigError),
    #[error("display error: {0}")]
    Display(#[from] DisplayError),
    #[error("failed to serialize summary: {0}")]
    Summary(#[from] serde_json::Error),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(args: Args) -> Result<(), HarnessError> {
    let config = match &args.config {
        Some(path) => DisplayConfig::from_file(path)?,
        None => DisplayConfig::default(),
    };

    let scene = match &args.scene {
        Some(path) => scenario::load_scene(path)?,
        None => {
            let start = args.start.unwrap_or_default();
            tracing::info!(
                "Generating scene with {} entities (seed {})",
                args.entities,
                args.seed
            );
            scenario::generate_scene(args.seed, args.entities, start)
        }
    };

    let mut display = scenario::build_display(&scene, SceneRecorder::new(), &config)?;
    let options = RunOptions {
        frames: args.frames,
        start: args.start.unwrap_or(scene.start),
        step_seconds: args.step_seconds,
        terrain_delay: args.terrain_delay,
        query: args.query.map(EntityId::new),
        allow_partial: args.allow_partial,
    };

    let summary = runner::run(&mut display, &options)?;
    match summary.ready_at {
        Some(frame) => tracing::info!("Ready after {} of {} frames", frame, summary.frames_run),
        None => tracing::warn!("Not ready after {} frames", summary.frames_run),
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
