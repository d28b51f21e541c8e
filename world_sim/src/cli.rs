//! Command-line interface for world_sim

use clap::Parser;
use std::path::PathBuf;

/// Headless combat world simulator
#[derive(Parser, Debug)]
#[command(name = "world_sim")]
#[command(about = "Runs a deterministic combat encounter on the world tick")]
#[command(version)]
pub struct Args {
    /// RNG seed; the same seed always replays the same fight
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Number of world ticks to run
    #[arg(long, default_value = "60")]
    pub ticks: u32,

    /// Milliseconds of game time per tick
    #[arg(long, default_value = "1000")]
    pub tick_ms: u64,

    /// Directory holding effects.toml and rules.toml
    #[arg(long, value_name = "DIR", default_value = "content")]
    pub content_dir: PathBuf,

    /// Write snapshots to stdout every N ticks (0 disables)
    #[arg(long, default_value = "10")]
    pub snapshot_every: u32,
}

pub fn parse_args() -> Args {
    Args::parse()
}
