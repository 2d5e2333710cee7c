//! CLI interface for fx-arcade
//!
//! Provides subcommands for:
//! - `run`: Start a game session against the rate feed
//! - `leaderboard`: Fetch and print the backend leaderboard
//! - `config`: Show configuration

mod leaderboard;
mod run;

pub use leaderboard::LeaderboardArgs;
pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fx-arcade")]
#[command(about = "FX rate prediction game: bet on currency moves, earn credits and badges")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a game session
    Run(RunArgs),
    /// Fetch and print the leaderboard
    Leaderboard(LeaderboardArgs),
    /// Show configuration
    Config,
}
