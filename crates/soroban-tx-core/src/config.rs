/// Network and driver configuration
/// Driver values come from environment variables with validated defaults

use std::env;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::types::Network;

/// Network configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network: Network,
    pub rpc_url: String,
    pub passphrase: String,
}

impl NetworkConfig {
    /// Defaults for a known network
    pub fn for_network(network: Network) -> Self {
        NetworkConfig {
            network,
            rpc_url: network.default_rpc_url().to_string(),
            passphrase: network.passphrase().to_string(),
        }
    }

    /// Check the endpoint is an http(s) URL and the passphrase is set
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return Err(ConfigError::InvalidConfig(format!(
                "RPC URL must be http(s): {}",
                self.rpc_url
            )));
        }
        if self.passphrase.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Network passphrase must not be empty".to_string(),
            ));
        }

        info!(
            "Network configuration loaded: network={}, endpoint={}",
            self.network, self.rpc_url
        );
        Ok(())
    }
}

/// Polling and retry policy for the lifecycle driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub poll_interval: Duration,
    pub confirm_timeout: Option<Duration>,
    /// Consecutive transport failures tolerated while polling
    pub transport_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            poll_interval: Duration::from_millis(3000),
            confirm_timeout: Some(Duration::from_secs(120)),
            transport_retries: 5,
            backoff_base: Duration::from_millis(500),
            backoff_max: Duration::from_secs(10),
        }
    }
}

impl DriverConfig {
    /// Load driver configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = DriverConfig::default();

        let poll_interval_ms = parse_env("TX_POLL_INTERVAL_MS", 3000u64)?;
        // 0 disables the confirmation deadline
        let timeout_secs = parse_env("TX_CONFIRM_TIMEOUT_SECS", 120u64)?;
        let transport_retries = parse_env("TX_TRANSPORT_RETRIES", defaults.transport_retries)?;
        let backoff_base_ms = parse_env("TX_BACKOFF_BASE_MS", 500u64)?;
        let backoff_max_ms = parse_env("TX_BACKOFF_MAX_MS", 10_000u64)?;

        let config = DriverConfig {
            poll_interval: Duration::from_millis(poll_interval_ms),
            confirm_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            transport_retries,
            backoff_base: Duration::from_millis(backoff_base_ms),
            backoff_max: Duration::from_millis(backoff_max_ms),
        };
        config.validate()?;

        debug!(
            poll_interval_ms,
            timeout_secs, transport_retries, backoff_base_ms, backoff_max_ms, "Driver configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval < Duration::from_millis(100)
            || self.poll_interval > Duration::from_secs(300)
        {
            return Err(ConfigError::InvalidConfig(
                "Poll interval must be between 100 ms and 300 seconds".to_string(),
            ));
        }
        if self.transport_retries == 0 {
            return Err(ConfigError::InvalidConfig(
                "Transport retry budget must be at least 1".to_string(),
            ));
        }
        if self.backoff_base > self.backoff_max {
            return Err(ConfigError::InvalidConfig(
                "Backoff base interval exceeds maximum".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidConfig(format!("Invalid {}: {} ({})", key, raw, e))),
        Err(_) => Ok(default),
    }
}
