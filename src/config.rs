//! Configuration types for fx-arcade

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Tracked currency pairs with their mock base rates
    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentConfig>,
}

/// Rate feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Feed mode: deterministic mock generator or live backend polling
    #[serde(default)]
    pub mode: FeedMode,

    /// Seed for the deterministic mock generator
    #[serde(default = "default_mock_seed")]
    pub mock_seed: u64,

    /// Mock tick interval (seconds)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Live polling interval (seconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

/// Feed mode: mock generation or live backend
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    #[default]
    Mock,
    Live,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

/// Game/session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_username")]
    pub username: String,

    /// Optional password for backend login
    #[serde(default)]
    pub password: Option<String>,

    /// Starting credits for a fresh ledger
    #[serde(default = "default_initial_credits")]
    pub initial_credits: Decimal,

    /// Path of the local player save file
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// A tracked instrument and its mock base rate
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    /// Currency pair identifier (e.g. "USD_SGD")
    pub pair: String,
    /// Mock mode base rate; the generator clamps to +/-10% of this
    pub base_rate: f64,
}

fn default_mock_seed() -> u64 {
    12345
}
fn default_tick_interval() -> u64 {
    1
}
fn default_poll_interval() -> u64 {
    5
}
fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_api_timeout() -> u64 {
    10
}
fn default_username() -> String {
    "guest".to_string()
}
fn default_initial_credits() -> Decimal {
    dec!(10000)
}
fn default_save_path() -> PathBuf {
    PathBuf::from("player.json")
}
fn default_log_level() -> String {
    "info".to_string()
}

fn default_instruments() -> Vec<InstrumentConfig> {
    vec![
        InstrumentConfig {
            pair: "USD_SGD".to_string(),
            base_rate: 1.35,
        },
        InstrumentConfig {
            pair: "USD_INR".to_string(),
            base_rate: 83.0,
        },
        InstrumentConfig {
            pair: "EUR_USD".to_string(),
            base_rate: 1.09,
        },
    ]
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mode: FeedMode::Mock,
            mock_seed: default_mock_seed(),
            tick_interval_secs: default_tick_interval(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: None,
            initial_credits: default_initial_credits(),
            save_path: default_save_path(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            api: ApiConfig::default(),
            game: GameConfig::default(),
            telemetry: TelemetryConfig::default(),
            instruments: default_instruments(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
