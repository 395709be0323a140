//! # raid-crypto — Proof Primitives for RAID
//!
//! Provides everything the head state machine needs to decide whether a
//! claimed proposer is attested by the beacon chain:
//!
//! - **SHA-256** helpers producing [`Bytes32`](raid_core::Bytes32) values.
//! - **Sorted-pair Merkle branches** ([`merkle`]): position-free folding where
//!   each step hashes the lexicographically smaller node first, plus a tree
//!   builder that produces roots and branches for arbitrary leaf sets.
//! - **Proof codec** ([`proof`]): the fixed big-endian wire layout a caller
//!   submits as opaque `proof_bytes`.
//! - **ProofVerifier** ([`verifier`]): index bound, root lookup, and branch
//!   check against a [`BeaconRootSource`].
//!
//! ## Crate Policy
//!
//! - Depends only on `raid-core` internally.
//! - Verification is a pure function of its inputs plus the root lookup.
//! - Tests use real SHA-256; nothing cryptographic is mocked.

pub mod error;
pub mod merkle;
pub mod proof;
pub mod sha256;
pub mod verifier;

pub use error::{MerkleError, ProofDecodeError, VerificationFailure};
pub use merkle::{fold_branch, hash_sorted_pair, leaf_for_address, SortedPairTree};
pub use proof::{Proof, MAX_BRANCH_DEPTH};
pub use sha256::{sha256, sha256_pair};
pub use verifier::{AttestedProposer, BeaconRootSource, ProofVerifier, DEFAULT_MAX_VALIDATOR_INDEX};
