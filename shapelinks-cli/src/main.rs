//! SHAPELINKS CLI - Command-line interface
//!
//! Commands:
//! - play: Play a match between two search agents
//! - think: Ask one agent for a move on a given position

mod match_cmd;
mod think_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use match_cmd::MatchArgs;
use think_cmd::ThinkArgs;

#[derive(Parser)]
#[command(name = "shapelinks")]
#[command(about = "SHAPELINKS search agents for the color/shape connection game")]
struct Cli {
    /// Random seed for reproducible hashing
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a match between two agents
    Play(MatchArgs),
    /// Print one agent's decision for a position
    Think(ThinkArgs),
}

fn main() -> anyhow::Result<()> {
    // Initialize logging (RUST_LOG=shapelinks_core=debug shows every search pass)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => match_cmd::run(args, cli.seed),
        Commands::Think(args) => think_cmd::run(args, cli.seed),
    }
}
