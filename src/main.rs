use clap::Parser;
use fx_arcade::cli::{Cli, Commands};
use fx_arcade::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    fx_arcade::telemetry::init_logging(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting game session");
            args.execute(config).await?;
        }
        Commands::Leaderboard(args) => {
            args.execute(config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Feed: {:?} (seed {})", config.feed.mode, config.feed.mock_seed);
            println!("  API: {}", config.api.base_url);
            println!(
                "  Game: {} starting with {} credits",
                config.game.username, config.game.initial_credits
            );
            for instrument in &config.instruments {
                println!("  Pair: {} @ {}", instrument.pair, instrument.base_rate);
            }
        }
    }

    Ok(())
}
