//! # Prove Subcommand
//!
//! Builds proposer proofs by hand. Computes the leaf for an address, folds
//! it through the given siblings, and prints the resulting root. With
//! `--slot` and `--index`, also prints the wire-encoded proof so it can be
//! pasted into a scenario's `proof_hex`.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use raid_core::{hex, Address, Bytes32, Slot};
use raid_crypto::{fold_branch, leaf_for_address, Proof, MAX_BRANCH_DEPTH};

/// Arguments for the `raid prove` subcommand.
#[derive(Args, Debug)]
pub struct ProveArgs {
    /// Proposer address (20 bytes, hex).
    #[arg(long)]
    pub address: String,

    /// Sibling hash (32 bytes, hex). Repeat in branch order, leaf upward.
    #[arg(long = "sibling")]
    pub siblings: Vec<String>,

    /// Beacon slot the proof attests to.
    #[arg(long, requires = "index")]
    pub slot: Option<u64>,

    /// Claimed validator index.
    #[arg(long, requires = "slot")]
    pub index: Option<u64>,
}

/// What `raid prove` prints.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ProveOutput {
    /// Hash of the right-aligned address.
    pub leaf: Bytes32,
    /// Leaf folded through every sibling.
    pub root: Bytes32,
    /// Encoded proof, when slot and index were given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
}

/// Compute the leaf, root, and optional encoded proof.
pub fn build(args: &ProveArgs) -> Result<ProveOutput> {
    let proposer: Address = args
        .address
        .parse()
        .with_context(|| format!("invalid address: {}", args.address))?;
    if args.siblings.len() > MAX_BRANCH_DEPTH {
        anyhow::bail!(
            "branch of {} siblings exceeds maximum depth {MAX_BRANCH_DEPTH}",
            args.siblings.len()
        );
    }
    let branch = args
        .siblings
        .iter()
        .map(|s| s.parse::<Bytes32>().with_context(|| format!("invalid sibling: {s}")))
        .collect::<Result<Vec<_>>>()?;

    let leaf = leaf_for_address(&proposer);
    let root = fold_branch(&leaf, &branch);
    let proof = match (args.slot, args.index) {
        (Some(slot), Some(proposer_index)) => Some(hex::encode_prefixed(
            &Proof {
                slot: Slot(slot),
                proposer_index,
                proposer,
                branch,
            }
            .encode(),
        )),
        _ => None,
    };
    Ok(ProveOutput { leaf, root, proof })
}

/// Execute the prove subcommand.
pub fn run_prove(args: &ProveArgs) -> Result<u8> {
    let output = build(args)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(0)
}
