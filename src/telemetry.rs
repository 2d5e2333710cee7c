//! Structured logging setup

use crate::config::TelemetryConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging from config; `RUST_LOG` takes precedence over the
/// configured level. The global subscriber can only be set once per
/// process, so a second call fails.
pub fn init_logging(config: &TelemetryConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_single_shot() {
        let config = TelemetryConfig {
            log_level: "debug".to_string(),
        };
        assert!(init_logging(&config).is_ok());
        // The global subscriber can only be set once per process
        assert!(init_logging(&config).is_err());
    }
}
