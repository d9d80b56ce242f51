#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs an Iso Defence scene headlessly.

mod scene_file;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use iso_defence_scene::{GameplaySpeed, Scene, SceneStats};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::scene_file::TowerRequest;

#[derive(Debug, Parser)]
#[command(
    name = "iso-defence",
    about = "Runs an Iso Defence scene without a window and reports the outcome",
    version
)]
struct Cli {
    /// Scene file in the line format or as `.toml`.
    #[arg(long)]
    scene: PathBuf,

    /// TOML file overriding the scene configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tower to place before the first frame, as COLUMN,ROW[,KIND].
    #[arg(long = "tower", value_name = "COLUMN,ROW[,KIND]")]
    towers: Vec<TowerRequest>,

    /// Simulated seconds after which the run stops.
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,

    /// Length of a single frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Gameplay speed, overriding the configuration.
    #[arg(long, value_enum)]
    speed: Option<SpeedArg>,

    /// Activates the first wave immediately instead of waiting for its delay.
    #[arg(long)]
    start_now: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SpeedArg {
    Normal,
    Fast,
    Fastest,
}

impl From<SpeedArg> for GameplaySpeed {
    fn from(speed: SpeedArg) -> Self {
        match speed {
            SpeedArg::Normal => Self::Normal,
            SpeedArg::Fast => Self::Fast,
            SpeedArg::Fastest => Self::Fastest,
        }
    }
}

/// Entry point for the Iso Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let summary = run(&cli)?;
    println!("{summary}");
    Ok(())
}

struct Summary {
    scene: String,
    frames: u64,
    simulated: Duration,
    cleared: bool,
    stats: SceneStats,
}

fn run(cli: &Cli) -> Result<Summary> {
    if cli.frame_ms == 0 {
        bail!("--frame-ms must be greater than zero");
    }
    let budget = Duration::try_from_secs_f32(cli.seconds)
        .with_context(|| format!("invalid --seconds value {}", cli.seconds))?;

    let definition = scene_file::load_definition(&cli.scene)?;
    let config = scene_file::load_config(cli.config.as_deref())?;
    let mut scene = Scene::load(definition, config).context("failed to start scene")?;
    if let Some(speed) = cli.speed {
        scene.set_speed(speed.into());
    }

    for request in &cli.towers {
        let kind = request.kind.unwrap_or_else(|| scene.selected_tower_kind());
        if let Err(reason) = scene.place_tower_of(kind, request.tile) {
            warn!(?kind, tile = ?request.tile, ?reason, "skipping tower");
        }
    }
    if cli.start_now {
        let _ = scene.start_next_wave();
    }

    let frame = Duration::from_millis(cli.frame_ms);
    let mut elapsed = Duration::ZERO;
    let mut frames = 0;
    while elapsed < budget && !scene.is_cleared() {
        let _ = scene.update(frame);
        elapsed += frame;
        frames += 1;
    }

    Ok(Summary {
        scene: scene.definition().name.clone(),
        frames,
        simulated: elapsed,
        cleared: scene.is_cleared(),
        stats: scene.stats(),
    })
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Scene: {}", self.scene)?;
        writeln!(
            f,
            "Frames: {} ({:.2} s of frame time)",
            self.frames,
            self.simulated.as_secs_f32()
        )?;
        writeln!(f, "Cleared: {}", if self.cleared { "yes" } else { "no" })?;
        writeln!(f, "Mobs spawned: {}", self.stats.spawned)?;
        writeln!(f, "Mobs killed: {}", self.stats.killed)?;
        writeln!(f, "Mobs escaped: {}", self.stats.escaped)?;
        write!(
            f,
            "Shots fired: {} (dropped {})",
            self.stats.shots_fired, self.stats.shots_dropped
        )
    }
}
