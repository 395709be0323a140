//! # Node Configuration
//!
//! Economic and protocol parameters for a RAID node. None of these are
//! derived; they are operator inputs.
//!
//! Sources, later wins:
//! 1. Built-in defaults (every field has one).
//! 2. A YAML file ([`RaidConfig::load`]).
//! 3. `RAID_*` environment variables ([`RaidConfig::apply_env`]).
//!
//! [`RaidConfig::validate`] runs after all three.

use std::path::{Path, PathBuf};

use raid_core::Address;
use raid_crypto::DEFAULT_MAX_VALIDATOR_INDEX;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted beacon root buffer.
pub const MAX_BEACON_ROOT_RETENTION: u64 = 1 << 20;

/// Parameters for a RAID node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RaidConfig {
    /// Defaults above this count trigger a slash on every further default.
    #[serde(default = "default_threshold")]
    pub default_threshold: u64,
    /// Collateral requested per qualifying default. May exceed
    /// `min_collateral`; a slash never seizes more than the balance held.
    #[serde(default = "default_slash_amount")]
    pub default_slash_amount: u128,
    /// Collateral required to be an active preconfer.
    #[serde(default = "default_min_collateral")]
    pub min_collateral: u128,
    /// Largest accepted blob payload, in bytes.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: usize,
    /// Fee charged per publication. Overpayment is refunded.
    #[serde(default)]
    pub publication_fee: u128,
    /// Number of beacon slots whose roots remain available.
    #[serde(default = "default_retention")]
    pub beacon_root_retention: u64,
    /// Largest validator index a proof may claim.
    #[serde(default = "default_max_validator_index")]
    pub max_validator_index: u64,
    /// Receives slashed collateral.
    #[serde(default = "default_treasury")]
    pub treasury: Address,
}

fn default_threshold() -> u64 {
    3
}

fn default_slash_amount() -> u128 {
    100_000
}

fn default_min_collateral() -> u128 {
    1_000_000
}

fn default_max_blob_size() -> usize {
    128 * 1024
}

fn default_retention() -> u64 {
    8191
}

fn default_max_validator_index() -> u64 {
    DEFAULT_MAX_VALIDATOR_INDEX
}

fn default_treasury() -> Address {
    Address::ZERO
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            default_slash_amount: default_slash_amount(),
            min_collateral: default_min_collateral(),
            max_blob_size: default_max_blob_size(),
            publication_fee: 0,
            beacon_root_retention: default_retention(),
            max_validator_index: default_max_validator_index(),
            treasury: default_treasury(),
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The YAML did not match the schema.
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An environment override could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },

    /// A parameter is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl RaidConfig {
    /// Parse YAML. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Apply `RAID_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary lookup (`RAID_*` variable names).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        fn parse<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            var: &'static str,
            slot: &mut T,
        ) -> Result<(), ConfigError> {
            if let Some(value) = lookup(var) {
                *slot = value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv { var, value })?;
            }
            Ok(())
        }

        parse(&lookup, "RAID_DEFAULT_THRESHOLD", &mut self.default_threshold)?;
        parse(&lookup, "RAID_DEFAULT_SLASH_AMOUNT", &mut self.default_slash_amount)?;
        parse(&lookup, "RAID_MIN_COLLATERAL", &mut self.min_collateral)?;
        parse(&lookup, "RAID_MAX_BLOB_SIZE", &mut self.max_blob_size)?;
        parse(&lookup, "RAID_PUBLICATION_FEE", &mut self.publication_fee)?;
        parse(&lookup, "RAID_BEACON_ROOT_RETENTION", &mut self.beacon_root_retention)?;
        parse(&lookup, "RAID_MAX_VALIDATOR_INDEX", &mut self.max_validator_index)?;
        parse(&lookup, "RAID_TREASURY", &mut self.treasury)?;
        Ok(())
    }

    /// Reject parameter combinations a node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_collateral == 0 {
            return Err(ConfigError::Invalid("min_collateral must be positive".into()));
        }
        if self.max_blob_size == 0 {
            return Err(ConfigError::Invalid("max_blob_size must be positive".into()));
        }
        if self.beacon_root_retention == 0
            || self.beacon_root_retention > MAX_BEACON_ROOT_RETENTION
        {
            return Err(ConfigError::Invalid(format!(
                "beacon_root_retention must be in 1..={MAX_BEACON_ROOT_RETENTION}, got {}",
                self.beacon_root_retention
            )));
        }
        Ok(())
    }
}
