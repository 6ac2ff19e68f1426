// src/logging.rs

use crate::types::LoggingConfig;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber for the host process.
///
/// `RUST_LOG` wins over the configured level when set. Fails instead of
/// panicking when a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(config)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

fn default_directive(config: &LoggingConfig) -> String {
    format!("lane_tracking={}", config.level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_targets_crate() {
        let config = LoggingConfig {
            level: "debug".to_string(),
        };
        assert_eq!(default_directive(&config), "lane_tracking=debug");
    }

    #[test]
    fn test_second_init_is_an_error() {
        let config = LoggingConfig::default();
        // The first call may race with other tests; only the second is certain.
        init(&config).ok();
        assert!(init(&config).is_err());
    }
}
