#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs headless Stackrunner sessions.

mod board;
mod session;
mod snapshot;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use stackrunner_core::{LevelId, SessionConfig, WELCOME_BANNER};
use stackrunner_world::{query, LevelShape};

use crate::{session::Session, snapshot::GridSnapshot};

/// Headless driver for the Stackrunner simulation.
#[derive(Debug, Parser)]
#[command(name = "stackrunner", version, about)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run an autoplay session and print the final board and statistics.
    Play(RunArgs),
    /// Run an autoplay session and print the resulting grid snapshot.
    Export(RunArgs),
    /// Decode a grid snapshot and print it.
    Inspect {
        /// Snapshot string produced by `export`.
        snapshot: String,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// TOML file with session tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Level to play, overriding the configuration.
    #[arg(long)]
    level: Option<LevelId>,
    /// Master seed, overriding the configuration.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of simulation frames to run.
    #[arg(long, default_value_t = 2_000)]
    ticks: u32,
    /// Simulated frame length in milliseconds.
    #[arg(long, default_value_t = 50)]
    frame_ms: u64,
    /// Snapshot to restore before the first frame.
    #[arg(long)]
    from: Option<String>,
}

/// Entry point for the Stackrunner command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Mode::Play(args) => {
            let session = run(&args)?;
            let world = session.world();
            println!("{WELCOME_BANNER}");
            println!("{}", session.status());
            let falling = query::falling_piece(world);
            if let Some(piece) = &falling {
                println!(
                    "falling: {}:{:?} at {:?}, {} degrees",
                    piece.definition.shape().get(),
                    piece.definition.ability(),
                    piece.origin,
                    piece.rotation.degrees()
                );
            }
            let falling = falling
                .map(|piece| piece.cells.to_vec())
                .unwrap_or_default();
            print!(
                "{}",
                board::render(query::level_shape(world), &query::snapshot(world), &falling)
            );
            let preview: Vec<String> = query::preview(world)
                .iter()
                .map(|piece| format!("{}:{:?}", piece.shape().get(), piece.ability()))
                .collect();
            println!("next: {}", preview.join(" "));
            if let Some(held) = query::held_piece(world) {
                println!("held: {}:{:?}", held.shape().get(), held.ability());
            }
            let stats = serde_json::to_string_pretty(session.stats())
                .context("failed to serialise session statistics")?;
            println!("{stats}");
        }
        Mode::Export(args) => {
            let session = run(&args)?;
            let world = session.world();
            let encoded = GridSnapshot {
                level: query::level(world),
                cells: query::snapshot(world),
            }
            .encode()
            .context("failed to encode grid snapshot")?;
            println!("{encoded}");
        }
        Mode::Inspect { snapshot } => {
            let decoded = GridSnapshot::decode(&snapshot).context("invalid grid snapshot")?;
            let shape = LevelShape::for_level(decoded.level);
            println!(
                "{} ({}x{}), {} occupied cells",
                decoded.level,
                shape.width(),
                shape.height(),
                decoded.cells.len()
            );
            print!("{}", board::render(&shape, &decoded.cells, &[]));
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(fallback)).init();
}

fn run(args: &RunArgs) -> Result<Session> {
    let config = load_config(args.config.as_deref())?;
    let level = args.level.unwrap_or(config.level);
    let seed = args.seed.unwrap_or(config.seed);
    let frame = Duration::from_millis(args.frame_ms.max(1));

    let mut session = Session::start(seed, level, &config, frame);
    if let Some(encoded) = &args.from {
        let restored = GridSnapshot::decode(encoded).context("invalid --from snapshot")?;
        if restored.level != level {
            anyhow::bail!(
                "snapshot belongs to {} but the session plays {level}",
                restored.level
            );
        }
        session.restore(restored.cells);
    }

    let frames = session.run(args.ticks);
    log::info!("simulated {frames} of {} frames", args.ticks);
    Ok(session)
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: SessionConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("config file {} is invalid", path.display()))?;
    Ok(config)
}
