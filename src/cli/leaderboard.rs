//! Leaderboard command implementation

use crate::api::ApiClient;
use crate::config::Config;
use clap::Args;

#[derive(Args, Debug)]
pub struct LeaderboardArgs {
    /// Maximum number of entries to print
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

impl LeaderboardArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let api = ApiClient::new(&config.api)?;
        let entries = api.leaderboard().await?;

        if entries.is_empty() {
            println!("Leaderboard is empty");
            return Ok(());
        }

        println!("{:>4}  {:<20} {:>10}", "Rank", "Player", "Score");
        for entry in entries.iter().take(self.limit) {
            println!(
                "{:>4}  {:<20} {:>10.0}",
                entry.rank, entry.username, entry.score
            );
        }
        Ok(())
    }
}
