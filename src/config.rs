//! Configuration management for the jackpot raffle service
//!
//! TOML file with environment variable overrides and validation. Oracle
//! parameters are carried opaquely: the raffle passes them through to the
//! randomness source without reinterpreting them.

use crate::errors::{ConfigError, RaffleResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JackpotConfig {
    pub raffle: RaffleParams,
    pub oracle: OracleConfig,
    pub api: ApiConfig,
}

/// Core raffle parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaffleParams {
    /// Minimum fee per entry, in base units
    pub entrance_fee: u64,
    /// Seconds a round must stay open before it becomes eligible for
    /// settlement (strict: elapsed must exceed this)
    pub interval_secs: u64,
}

/// Opaque oracle subscription parameters, passed through on every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub key_hash: String,
    pub subscription_id: u64,
    pub confirmations: u16,
    pub callback_gas_limit: u32,
    /// Simulated block time used by the bundled coordinator to scale its
    /// delivery delay by `confirmations`
    pub block_time_ms: u64,
}

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enabled: bool,
    pub listen_address: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for JackpotConfig {
    fn default() -> Self {
        Self {
            raffle: RaffleParams::default(),
            oracle: OracleConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Default for RaffleParams {
    fn default() -> Self {
        Self {
            entrance_fee: 10_000_000, // 0.01 in 1e9 base units
            interval_secs: 30,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            key_hash: "0x474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c"
                .to_string(),
            subscription_id: 1,
            confirmations: 3,
            callback_gas_limit: 500_000,
            block_time_ms: 400,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_address: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        }
    }
}

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> RaffleResult<JackpotConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            JackpotConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;

        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> RaffleResult<JackpotConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadFailed(format!("Failed to read {}: {}", path, e))
        })?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    fn apply_env_overrides(&self, config: &mut JackpotConfig) -> RaffleResult<()> {
        if let Ok(fee) = env::var("JACKPOT_ENTRANCE_FEE") {
            config.raffle.entrance_fee = fee.parse().map_err(|_| ConfigError::InvalidValue {
                field: "JACKPOT_ENTRANCE_FEE".to_string(),
                value: fee,
                reason: "Invalid fee amount".to_string(),
            })?;
        }
        if let Ok(interval) = env::var("JACKPOT_INTERVAL_SECS") {
            config.raffle.interval_secs =
                interval.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "JACKPOT_INTERVAL_SECS".to_string(),
                    value: interval,
                    reason: "Invalid interval".to_string(),
                })?;
        }
        if let Ok(sub) = env::var("JACKPOT_ORACLE_SUBSCRIPTION_ID") {
            config.oracle.subscription_id =
                sub.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "JACKPOT_ORACLE_SUBSCRIPTION_ID".to_string(),
                    value: sub,
                    reason: "Invalid subscription id".to_string(),
                })?;
        }
        if let Ok(key_hash) = env::var("JACKPOT_ORACLE_KEY_HASH") {
            config.oracle.key_hash = key_hash;
        }
        if let Ok(enabled) = env::var("JACKPOT_API_ENABLED") {
            config.api.enabled = enabled.parse().map_err(|_| ConfigError::InvalidValue {
                field: "JACKPOT_API_ENABLED".to_string(),
                value: enabled,
                reason: "Invalid boolean value".to_string(),
            })?;
        }
        if let Ok(port) = env::var("JACKPOT_API_PORT") {
            config.api.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: "JACKPOT_API_PORT".to_string(),
                value: port,
                reason: "Invalid port number".to_string(),
            })?;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self, config: &JackpotConfig) -> RaffleResult<()> {
        if config.raffle.entrance_fee == 0 {
            return Err(ConfigError::InvalidValue {
                field: "raffle.entrance_fee".to_string(),
                value: "0".to_string(),
                reason: "Entrance fee cannot be zero".to_string(),
            }
            .into());
        }

        if config.raffle.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "raffle.interval_secs".to_string(),
                value: "0".to_string(),
                reason: "Round interval cannot be zero".to_string(),
            }
            .into());
        }

        if config.oracle.key_hash.is_empty() {
            return Err(ConfigError::MissingRequired("oracle.key_hash".to_string()).into());
        }

        if config.oracle.subscription_id == 0 {
            return Err(ConfigError::InvalidValue {
                field: "oracle.subscription_id".to_string(),
                value: "0".to_string(),
                reason: "Subscription id cannot be zero".to_string(),
            }
            .into());
        }

        if config.oracle.callback_gas_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "oracle.callback_gas_limit".to_string(),
                value: "0".to_string(),
                reason: "Callback gas limit cannot be zero".to_string(),
            }
            .into());
        }

        if config.api.enabled && config.api.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.port".to_string(),
                value: "0".to_string(),
                reason: "API port cannot be zero when API is enabled".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &JackpotConfig, path: &str) -> RaffleResult<()> {
        let toml_string = toml::to_string_pretty(config).map_err(|e| {
            ConfigError::SaveFailed(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
