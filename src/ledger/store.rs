//! Local player-state persistence
//!
//! JSON save file read once at session start and rewritten after every
//! ledger mutation. A missing or corrupt file degrades to a fresh ledger.

use super::PlayerLedger;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Reads and writes the player save file
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load the saved ledger, or a fresh one when no usable save exists
    pub fn load_or_default(&self, username: &str, initial_credits: Decimal) -> PlayerLedger {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(ledger) => ledger,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "corrupt player save, starting fresh"
                    );
                    PlayerLedger::new(username, initial_credits)
                }
            },
            Err(_) => PlayerLedger::new(username, initial_credits),
        }
    }

    /// Write the ledger to disk
    pub fn save(&self, ledger: &PlayerLedger) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(ledger)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
