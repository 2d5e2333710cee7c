//! Session composition root
//!
//! Wires config into owned components with explicit dependency injection:
//! no process-wide singletons. The session owns the feed loop task and the
//! engine; everything else holds `Arc` handles.

use crate::api::ApiClient;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, FeedMode};
use crate::feed::RateFeed;
use crate::ledger::LedgerStore;
use crate::prediction::PredictionEngine;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A running game session
pub struct GameSession {
    config: Config,
    feed: Arc<RateFeed>,
    engine: Arc<PredictionEngine>,
    api: Option<Arc<ApiClient>>,
    feed_task: JoinHandle<()>,
}

impl GameSession {
    /// Start a session on the system clock
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        Self::start_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Start a session with an injected clock (used by tests)
    pub async fn start_with_clock(
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let api = match config.feed.mode {
            FeedMode::Live => Some(Arc::new(ApiClient::new(&config.api)?)),
            FeedMode::Mock => None,
        };

        // Login is the one backend call the core waits for; a failure is
        // logged and the session continues unauthenticated.
        if let Some(api) = &api {
            match api
                .login(&config.game.username, config.game.password.as_deref())
                .await
            {
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "login failed, continuing without a token");
                }
            }
        }

        let feed = Arc::new(RateFeed::new(
            config.feed.clone(),
            config.instruments.clone(),
            Arc::clone(&clock),
            api.clone(),
        ));

        let store = LedgerStore::new(config.game.save_path.clone());
        let ledger = store.load_or_default(&config.game.username, config.game.initial_credits);
        tracing::info!(
            username = %ledger.username,
            credits = %ledger.credits,
            mode = ?config.feed.mode,
            "session started"
        );

        let engine = Arc::new(PredictionEngine::new(
            Arc::clone(&feed),
            ledger,
            store,
            clock,
            api.clone(),
        ));

        let feed_task = feed.spawn();

        Ok(Self {
            config,
            feed,
            engine,
            api,
            feed_task,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn feed(&self) -> &Arc<RateFeed> {
        &self.feed
    }

    pub fn engine(&self) -> &Arc<PredictionEngine> {
        &self.engine
    }

    pub fn api(&self) -> Option<&Arc<ApiClient>> {
        self.api.as_ref()
    }

    /// Stop the feed loop and abort any pending resolution timer
    pub fn shutdown(&self) {
        self.feed_task.abort();
        self.engine.shutdown();
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
