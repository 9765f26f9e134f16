//! Configuration management for Emberchain

use serde::Deserialize;
use std::fs;

/// Ledger engine tunables, loaded from `config.toml` when present.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Proof-of-work difficulty the chain starts at, in leading zero hex
    /// nibbles. The difficulty policy retargets it from block timing.
    #[serde(default = "default_initial_difficulty")]
    pub initial_difficulty: u32,
    /// Fraction of every admitted transfer retained by the tax pool.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,
    /// Reward minted for the miner of every block.
    #[serde(default = "default_base_reward")]
    pub base_reward: u64,
    /// Extra reward minted when the chain length hits a bonus period.
    #[serde(default = "default_bonus_amount")]
    pub bonus_amount: u64,
    /// Every how many blocks the bonus is paid.
    #[serde(default = "default_bonus_period")]
    pub bonus_period: u64,
    /// Transfers above this amount are flagged and their senders
    /// blacklisted by the fraud screen.
    #[serde(default = "default_suspicious_ceiling")]
    pub suspicious_ceiling: u64,
    /// Serialized size cap for a single transaction.
    #[serde(default = "default_max_transaction_bytes")]
    pub max_transaction_bytes: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_difficulty: default_initial_difficulty(),
            fee_rate: default_fee_rate(),
            base_reward: default_base_reward(),
            bonus_amount: default_bonus_amount(),
            bonus_period: default_bonus_period(),
            suspicious_ceiling: default_suspicious_ceiling(),
            max_transaction_bytes: default_max_transaction_bytes(),
        }
    }
}

fn default_initial_difficulty() -> u32 {
    4
}

fn default_fee_rate() -> f64 {
    0.02
}

fn default_base_reward() -> u64 {
    50
}

fn default_bonus_amount() -> u64 {
    25
}

fn default_bonus_period() -> u64 {
    10
}

fn default_suspicious_ceiling() -> u64 {
    10_000
}

fn default_max_transaction_bytes() -> usize {
    100_000
}

/// Read the configuration from `path`, with full defaults when the file
/// is absent or empty.
pub fn load_config(path: &str) -> Result<LedgerConfig, Box<dyn std::error::Error>> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: LedgerConfig = if config_str.is_empty() {
        LedgerConfig::default()
    } else {
        toml::from_str(&config_str)?
    };

    validate(&config)?;
    Ok(config)
}

/// Validate critical values before a ledger is built from them.
pub fn validate(config: &LedgerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.initial_difficulty < 1 {
        return Err("initial_difficulty must be at least 1".into());
    }

    if config.fee_rate <= 0.0 || config.fee_rate >= 1.0 {
        return Err("fee_rate must be strictly between 0 and 1".into());
    }

    if config.base_reward == 0 {
        return Err("base_reward must be positive".into());
    }

    if config.bonus_period == 0 {
        return Err("bonus_period must be at least 1".into());
    }

    if config.suspicious_ceiling == 0 {
        return Err("suspicious_ceiling must be positive".into());
    }

    if config.max_transaction_bytes == 0 {
        return Err("max_transaction_bytes must be positive".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LedgerConfig::default();
        assert!(validate(&config).is_ok());
        assert_eq!(config.initial_difficulty, 4);
        assert_eq!(config.base_reward, 50);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: LedgerConfig = toml::from_str("initial_difficulty = 2").unwrap();
        assert_eq!(config.initial_difficulty, 2);
        assert_eq!(config.fee_rate, 0.02);
        assert_eq!(config.bonus_period, 10);
    }

    #[test]
    fn test_fee_rate_bounds_rejected() {
        let mut config = LedgerConfig::default();
        config.fee_rate = 0.0;
        assert!(validate(&config).is_err());
        config.fee_rate = 1.0;
        assert!(validate(&config).is_err());
        config.fee_rate = 0.5;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_difficulty_rejected() {
        let mut config = LedgerConfig::default();
        config.initial_difficulty = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config("definitely-not-a-config.toml").unwrap();
        assert_eq!(
            config.initial_difficulty,
            LedgerConfig::default().initial_difficulty
        );
    }
}
