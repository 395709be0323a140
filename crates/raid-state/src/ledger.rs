//! # Publication Ledger
//!
//! Mints monotonically numbered publication records. Minting is split in
//! two so that a publish call can validate everything before committing
//! anything:
//!
//! 1. [`PublicationLedger::stage`] checks blob size, slot order, and fee, and
//!    returns a [`StagedPublication`] carrying the id it *would* receive.
//!    Nothing is written.
//! 2. [`PublicationLedger::commit`] inserts the staged record, accrues the
//!    fee, and reports the overpayment to refund.
//!
//! Dropping a staged publication leaves the ledger untouched.
//!
//! ## Invariants
//!
//! - Ids start at 1 and increase by exactly 1 per committed publication.
//! - Committed slots are strictly increasing in id order.

use std::collections::BTreeMap;

use raid_core::{Address, Bytes32, PublicationId, Slot, Timestamp};
use raid_crypto::sha256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A committed publication record. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    /// Ledger-assigned id.
    pub id: PublicationId,
    /// The participant that published.
    pub publisher: Address,
    /// SHA-256 of the blob payload.
    pub blob_digest: Bytes32,
    /// Beacon slot claimed at publication time.
    pub slot: Slot,
    /// When the record was created.
    pub timestamp: Timestamp,
}

/// A validated but uncommitted publication.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a staged publication does nothing until committed"]
pub struct StagedPublication {
    publication: Publication,
    fee_required: u128,
    fee_paid: u128,
}

impl StagedPublication {
    /// The id the publication will receive on commit.
    pub fn id(&self) -> PublicationId {
        self.publication.id
    }

    /// Overpayment to be returned to the publisher on commit.
    pub fn refund(&self) -> u128 {
        self.fee_paid - self.fee_required
    }
}

/// Why the ledger refused to mint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Payload exceeds the configured size cap.
    #[error("blob of {size} bytes exceeds maximum {max}")]
    BlobTooLarge {
        /// Payload size.
        size: usize,
        /// Configured cap.
        max: usize,
    },

    /// Slot is not strictly after the last committed slot.
    #[error("{slot} is not after last published {last}")]
    InvalidSlotOrder {
        /// Requested slot.
        slot: Slot,
        /// Last committed slot.
        last: Slot,
    },

    /// Fee paid is below the configured publication fee.
    #[error("insufficient fee: paid {paid}, required {required}")]
    InsufficientFee {
        /// Amount paid.
        paid: u128,
        /// Amount required.
        required: u128,
    },

    /// The id space is exhausted.
    #[error("publication id space exhausted")]
    IdOverflow,

    /// A staged publication was committed after another commit.
    #[error("staged {staged} is stale; next id is {next}")]
    StaleStage {
        /// Id the stage was issued for.
        staged: PublicationId,
        /// Id the ledger would assign now.
        next: PublicationId,
    },
}

impl LedgerError {
    /// Stable short name.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BlobTooLarge { .. } => "BlobTooLarge",
            Self::InvalidSlotOrder { .. } => "InvalidSlotOrder",
            Self::InsufficientFee { .. } => "InsufficientFee",
            Self::IdOverflow => "IdOverflow",
            Self::StaleStage { .. } => "StaleStage",
        }
    }
}

/// Auto-incrementing registry of publications with a size cap, slot
/// ordering, and an optional fee.
#[derive(Debug, Clone)]
pub struct PublicationLedger {
    publications: BTreeMap<PublicationId, Publication>,
    next_id: PublicationId,
    last_slot: Option<Slot>,
    max_blob_size: usize,
    fee: u128,
    collected_fees: u128,
}

impl PublicationLedger {
    /// Empty ledger. The first committed publication receives id 1.
    pub fn new(max_blob_size: usize, fee: u128) -> Self {
        Self {
            publications: BTreeMap::new(),
            next_id: PublicationId(1),
            last_slot: None,
            max_blob_size,
            fee,
            collected_fees: 0,
        }
    }

    /// Validate a publication without recording it.
    pub fn stage(
        &self,
        publisher: Address,
        blob: &[u8],
        slot: Slot,
        fee_paid: u128,
        at: Timestamp,
    ) -> Result<StagedPublication, LedgerError> {
        if blob.len() > self.max_blob_size {
            return Err(LedgerError::BlobTooLarge {
                size: blob.len(),
                max: self.max_blob_size,
            });
        }
        if let Some(last) = self.last_slot {
            if slot <= last {
                return Err(LedgerError::InvalidSlotOrder { slot, last });
            }
        }
        if fee_paid < self.fee {
            return Err(LedgerError::InsufficientFee {
                paid: fee_paid,
                required: self.fee,
            });
        }
        // Reserve the successor too, so commit can always advance next_id.
        self.next_id.next().ok_or(LedgerError::IdOverflow)?;

        Ok(StagedPublication {
            publication: Publication {
                id: self.next_id,
                publisher,
                blob_digest: sha256(blob),
                slot,
                timestamp: at,
            },
            fee_required: self.fee,
            fee_paid,
        })
    }

    /// Commit a staged publication. Returns `(id, refund)`.
    pub fn commit(
        &mut self,
        staged: StagedPublication,
    ) -> Result<(PublicationId, u128), LedgerError> {
        if staged.id() != self.next_id {
            return Err(LedgerError::StaleStage {
                staged: staged.id(),
                next: self.next_id,
            });
        }
        let refund = staged.refund();
        let id = staged.publication.id;
        self.next_id = id.next().ok_or(LedgerError::IdOverflow)?;
        self.last_slot = Some(staged.publication.slot);
        self.collected_fees = self.collected_fees.saturating_add(staged.fee_required);
        self.publications.insert(id, staged.publication);
        Ok((id, refund))
    }

    /// Look up a committed publication.
    pub fn get(&self, id: PublicationId) -> Option<&Publication> {
        self.publications.get(&id)
    }

    /// Id of the most recent publication, or `NONE`.
    pub fn latest_id(&self) -> PublicationId {
        self.publications
            .keys()
            .next_back()
            .copied()
            .unwrap_or(PublicationId::NONE)
    }

    /// Slot of the most recent publication.
    pub fn last_slot(&self) -> Option<Slot> {
        self.last_slot
    }

    /// Number of committed publications.
    pub fn len(&self) -> usize {
        self.publications.len()
    }

    /// Whether nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.publications.is_empty()
    }

    /// Fees accrued and not yet withdrawn.
    pub fn collected_fees(&self) -> u128 {
        self.collected_fees
    }

    /// Take all accrued fees.
    pub fn withdraw_fees(&mut self) -> u128 {
        std::mem::take(&mut self.collected_fees)
    }
}
