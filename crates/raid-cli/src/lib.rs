//! # raid-cli — Command-Line Tooling for RAID
//!
//! Provides the `raid` binary.
//!
//! ## Subcommands
//!
//! - `raid run` replays a YAML scenario against a fresh in-process node and
//!   prints every step's outcome plus the final heads and events as JSON.
//! - `raid prove` folds a proposer leaf through a sibling branch and,
//!   given a slot and validator index, prints the encoded proof.
//!
//! ```bash
//! raid run --scenario advance.yaml --config raid.yaml
//! raid prove --address 0xa1a1...a1 --sibling 0x11..11 --slot 1000 --index 42
//! ```

#![deny(missing_docs)]

pub mod prove;
pub mod scenario;

use std::path::Path;

use anyhow::{Context, Result};
use raid_state::RaidConfig;

/// Load node configuration: file (if any), then `RAID_*` overrides.
pub fn load_config(path: Option<&Path>) -> Result<RaidConfig> {
    let mut config = match path {
        Some(p) => RaidConfig::load(p)
            .with_context(|| format!("failed to load config: {}", p.display()))?,
        None => RaidConfig::default(),
    };
    config
        .apply_env()
        .context("failed to apply RAID_* environment overrides")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}
