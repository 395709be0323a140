//! # Publish Errors
//!
//! Every way a publish call can fail, grouped into the four classes that
//! decide what (if anything) survives the failure:
//!
//! | Class | Variants | Persisted on failure |
//! |-------|----------|----------------------|
//! | Precondition | `ContractPaused`, `NotPreconfer` | nothing |
//! | Ledger rejection | `Ledger(_)` | nothing |
//! | Proof failure | `InvalidProof { .. }`, `Slash(_)` | default counter, slash |
//! | Protocol violation | `MustReplaceGenesis`, `CannotReplaceWithSameProposer`, `CannotAdvanceWithDifferentProposer`, `InvalidTransition` | nothing |

use raid_core::{Address, PublicationId};
use raid_crypto::VerificationFailure;
use serde::Serialize;
use thiserror::Error;

use crate::bond::BondError;
use crate::head::{HeadAction, HeadPhase};
use crate::ledger::LedgerError;

/// Failure class of a [`PublishError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected before touching the ledger.
    Precondition,
    /// Rejected by the publication ledger.
    LedgerRejection,
    /// The submitted proof did not verify.
    ProofFailure,
    /// The proof verified but the requested action is not allowed.
    ProtocolViolation,
}

/// Why a publish call failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The pause gate is set.
    #[error("contract paused")]
    ContractPaused,

    /// The caller is not an active bonded participant.
    #[error("{0} is not an active preconfer")]
    NotPreconfer(Address),

    /// The publication ledger refused to mint.
    #[error("publication rejected: {0}")]
    Ledger(#[from] LedgerError),

    /// The first publication must install a candidate.
    #[error("genesis publication must replace (replace=false given)")]
    MustReplaceGenesis,

    /// Proof verification failed; the caller's default was recorded.
    #[error("invalid proof from {caller}: {cause} (defaults: {defaults})")]
    InvalidProof {
        /// The submitting participant.
        caller: Address,
        /// Why verification failed.
        cause: VerificationFailure,
        /// The caller's default count after this failure.
        defaults: u64,
        /// Collateral seized by this failure, if the threshold was crossed.
        slashed: Option<u128>,
    },

    /// The bond registry refused the slash for a recorded default.
    #[error("slash failed after default: {0}")]
    Slash(#[from] BondError),

    /// Replace requires a proof naming someone other than the candidate's publisher.
    #[error("cannot replace candidate {candidate} with a proof naming its own publisher {proposer}")]
    CannotReplaceWithSameProposer {
        /// The current unsafe head.
        candidate: PublicationId,
        /// The attested proposer (equal to the candidate's publisher).
        proposer: Address,
    },

    /// Advance requires a proof naming the candidate's publisher.
    #[error("cannot advance candidate {candidate}: proof names {attested}, publisher is {publisher}")]
    CannotAdvanceWithDifferentProposer {
        /// The current unsafe head.
        candidate: PublicationId,
        /// The candidate's publisher.
        publisher: Address,
        /// The attested proposer.
        attested: Address,
    },

    /// The requested head movement is not legal from the current heads.
    #[error("illegal {action:?} transition from {phase} to {pid}")]
    InvalidTransition {
        /// Phase the heads were in.
        phase: HeadPhase,
        /// Movement that was attempted.
        action: HeadAction,
        /// Publication that would have become the unsafe head.
        pid: PublicationId,
    },

    /// The unsafe head points at a publication the ledger does not hold.
    #[error("unsafe head {0} missing from publication ledger")]
    MissingCandidate(PublicationId),
}

impl PublishError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ContractPaused | Self::NotPreconfer(_) | Self::MissingCandidate(_) => {
                ErrorKind::Precondition
            }
            Self::Ledger(_) => ErrorKind::LedgerRejection,
            Self::InvalidProof { .. } | Self::Slash(_) => ErrorKind::ProofFailure,
            Self::MustReplaceGenesis
            | Self::CannotReplaceWithSameProposer { .. }
            | Self::CannotAdvanceWithDifferentProposer { .. }
            | Self::InvalidTransition { .. } => ErrorKind::ProtocolViolation,
        }
    }

    /// Stable short name for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContractPaused => "ContractPaused",
            Self::NotPreconfer(_) => "NotPreconfer",
            Self::Ledger(e) => e.code(),
            Self::MustReplaceGenesis => "MustReplaceGenesis",
            Self::InvalidProof { .. } | Self::Slash(_) => "InvalidProof",
            Self::CannotReplaceWithSameProposer { .. } => "CannotReplaceWithSameProposer",
            Self::CannotAdvanceWithDifferentProposer { .. } => {
                "CannotAdvanceWithDifferentProposer"
            }
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::MissingCandidate(_) => "MissingCandidate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raid_core::Slot;

    #[test]
    fn test_kinds() {
        assert_eq!(PublishError::ContractPaused.kind(), ErrorKind::Precondition);
        assert_eq!(
            PublishError::NotPreconfer(Address::ZERO).kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            PublishError::Ledger(LedgerError::BlobTooLarge { size: 2, max: 1 }).kind(),
            ErrorKind::LedgerRejection
        );
        assert_eq!(
            PublishError::MustReplaceGenesis.kind(),
            ErrorKind::ProtocolViolation
        );
        let invalid = PublishError::InvalidProof {
            caller: Address::ZERO,
            cause: VerificationFailure::InvalidBeaconRoot { slot: Slot(1) },
            defaults: 1,
            slashed: None,
        };
        assert_eq!(invalid.kind(), ErrorKind::ProofFailure);
        assert_eq!(invalid.code(), "InvalidProof");
    }

    #[test]
    fn test_invalid_transition_is_protocol_violation() {
        let e = PublishError::InvalidTransition {
            phase: HeadPhase::Active,
            action: HeadAction::Genesis,
            pid: PublicationId(3),
        };
        assert_eq!(e.kind(), ErrorKind::ProtocolViolation);
        assert_eq!(e.code(), "InvalidTransition");
        assert!(e.to_string().contains("ACTIVE"));
    }

    #[test]
    fn test_display_names_participants() {
        let e = PublishError::CannotAdvanceWithDifferentProposer {
            candidate: PublicationId(4),
            publisher: Address([1; 20]),
            attested: Address([2; 20]),
        };
        let s = e.to_string();
        assert!(s.contains("pub:4"));
        assert!(s.contains(&Address([2; 20]).to_hex()));
    }
}
