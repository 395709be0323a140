//! # Cryptographic Error Types
//!
//! Failures raised while decoding or verifying a proposer proof, and while
//! building Merkle branches.

use raid_core::{Bytes32, Slot};
use thiserror::Error;

/// The submitted proof bytes do not follow the wire layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofDecodeError {
    /// Input ended before a field was complete.
    #[error("proof truncated: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        /// Offset of the field being read.
        offset: usize,
        /// Bytes the field requires.
        needed: usize,
        /// Bytes left in the input.
        available: usize,
    },

    /// Bytes remain after the declared branch.
    #[error("proof has {0} trailing bytes")]
    TrailingBytes(usize),

    /// The declared branch is longer than any real tree.
    #[error("proof branch depth {depth} exceeds maximum {max}")]
    BranchTooDeep {
        /// Declared depth.
        depth: usize,
        /// Accepted maximum.
        max: usize,
    },
}

/// Why a proposer proof was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    /// The proof bytes could not be decoded.
    #[error("malformed proof: {0}")]
    Malformed(#[from] ProofDecodeError),

    /// Claimed validator index is above the registry bound.
    #[error("invalid proposer index {index} (max {max})")]
    InvalidProposerIndex {
        /// Claimed index.
        index: u64,
        /// Accepted maximum.
        max: u64,
    },

    /// No trusted root is available for the slot.
    #[error("invalid beacon root: no commitment for {slot}")]
    InvalidBeaconRoot {
        /// Slot the proof attests to.
        slot: Slot,
    },

    /// The branch does not fold to the trusted root.
    #[error("invalid merkle proof for {slot}: computed {computed}, expected {expected}")]
    InvalidMerkleProof {
        /// Slot the proof attests to.
        slot: Slot,
        /// Root folded from the branch.
        computed: Bytes32,
        /// Root supplied by the beacon source.
        expected: Bytes32,
    },
}

impl VerificationFailure {
    /// Stable short name, used in slash reasons and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed_proof",
            Self::InvalidProposerIndex { .. } => "invalid_proposer_index",
            Self::InvalidBeaconRoot { .. } => "invalid_beacon_root",
            Self::InvalidMerkleProof { .. } => "invalid_merkle_proof",
        }
    }
}

/// Error building a Merkle tree or branch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// A tree needs at least one leaf.
    #[error("merkle tree requires at least one leaf")]
    Empty,

    /// Requested leaf does not exist.
    #[error("leaf index {index} out of range for {len} leaves")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of leaves.
        len: usize,
    },
}
