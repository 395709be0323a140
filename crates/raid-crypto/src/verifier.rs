//! # Proposer Proof Verifier
//!
//! Decides whether a claimed proposer for a beacon slot is committed to by
//! that slot's trusted root. Checks run in a fixed order and stop at the
//! first failure:
//!
//! 1. `proposer_index <= max_validator_index`, else `InvalidProposerIndex`.
//! 2. `roots.root_at(slot)` is non-zero, else `InvalidBeaconRoot`.
//! 3. `fold_branch(leaf(proposer), branch) == root`, else `InvalidMerkleProof`.
//!
//! On success the verifier returns the attested proposer. It has no state
//! and no side effects.

use raid_core::{Address, Bytes32, Slot};
use serde::{Deserialize, Serialize};

use crate::error::VerificationFailure;
use crate::merkle::{fold_branch, leaf_for_address};
use crate::proof::Proof;

/// Validator registry limit (2^40) minus one.
pub const DEFAULT_MAX_VALIDATOR_INDEX: u64 = (1 << 40) - 1;

/// Trusted lookup from beacon slot to its 32-byte root.
///
/// Implementations return [`Bytes32::ZERO`] for slots that were never
/// committed or have left the retention window.
pub trait BeaconRootSource {
    /// The trusted root for `slot`, or all-zero if unavailable.
    fn root_at(&self, slot: Slot) -> Bytes32;
}

impl<T: BeaconRootSource + ?Sized> BeaconRootSource for &T {
    fn root_at(&self, slot: Slot) -> Bytes32 {
        (**self).root_at(slot)
    }
}

/// Result of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedProposer {
    /// Slot the proof attested to.
    pub slot: Slot,
    /// Proposer identity committed to by the slot's root.
    pub proposer: Address,
}

/// Stateless proposer proof verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofVerifier {
    max_validator_index: u64,
}

impl Default for ProofVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VALIDATOR_INDEX)
    }
}

impl ProofVerifier {
    /// Verifier that rejects indices above `max_validator_index`.
    pub fn new(max_validator_index: u64) -> Self {
        Self {
            max_validator_index,
        }
    }

    /// The configured index bound.
    pub fn max_validator_index(&self) -> u64 {
        self.max_validator_index
    }

    /// Verify a decoded proof against `roots`.
    pub fn verify(
        &self,
        proof: &Proof,
        roots: &dyn BeaconRootSource,
    ) -> Result<AttestedProposer, VerificationFailure> {
        if proof.proposer_index > self.max_validator_index {
            return Err(VerificationFailure::InvalidProposerIndex {
                index: proof.proposer_index,
                max: self.max_validator_index,
            });
        }

        let expected = roots.root_at(proof.slot);
        if expected.is_zero() {
            return Err(VerificationFailure::InvalidBeaconRoot { slot: proof.slot });
        }

        let computed = fold_branch(&leaf_for_address(&proof.proposer), &proof.branch);
        if computed != expected {
            return Err(VerificationFailure::InvalidMerkleProof {
                slot: proof.slot,
                computed,
                expected,
            });
        }

        tracing::debug!(
            slot = proof.slot.get(),
            proposer = %proof.proposer,
            depth = proof.branch.len(),
            "proposer proof verified"
        );
        Ok(AttestedProposer {
            slot: proof.slot,
            proposer: proof.proposer,
        })
    }

    /// Decode `bytes` and verify. A decode error is a verification failure.
    pub fn verify_bytes(
        &self,
        bytes: &[u8],
        roots: &dyn BeaconRootSource,
    ) -> Result<AttestedProposer, VerificationFailure> {
        let proof = Proof::decode(bytes)?;
        self.verify(&proof, roots)
    }
}
