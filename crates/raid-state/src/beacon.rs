//! # Beacon Root Buffer
//!
//! In-memory [`BeaconRootSource`] modelled on a fixed-length history
//! buffer: slot `s` is stored at position `s % retention`. A lookup returns
//! the stored root only if that position still holds slot `s`; a slot that
//! was never committed, or has since been overwritten by a later slot, reads
//! as all-zero.

use raid_core::{Bytes32, Slot};
use raid_crypto::BeaconRootSource;
use thiserror::Error;

/// Beacon root buffer failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BeaconError {
    /// All-zero is the "unavailable" sentinel and cannot be stored.
    #[error("cannot commit an all-zero root for {0}")]
    ZeroRoot(Slot),

    /// A buffer needs at least one position.
    #[error("retention window must be at least one slot")]
    ZeroRetention,
}

/// Ring buffer of the most recent `retention` beacon roots.
#[derive(Debug, Clone)]
pub struct InMemoryBeaconRoots {
    entries: Vec<Option<(Slot, Bytes32)>>,
}

impl InMemoryBeaconRoots {
    /// Empty buffer holding `retention` positions.
    pub fn new(retention: u64) -> Result<Self, BeaconError> {
        if retention == 0 {
            return Err(BeaconError::ZeroRetention);
        }
        Ok(Self {
            entries: vec![None; retention as usize],
        })
    }

    /// Number of positions in the ring.
    pub fn retention(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Record `root` for `slot`, evicting whatever shared its position.
    pub fn commit(&mut self, slot: Slot, root: Bytes32) -> Result<(), BeaconError> {
        if root.is_zero() {
            return Err(BeaconError::ZeroRoot(slot));
        }
        let pos = self.position(slot);
        self.entries[pos] = Some((slot, root));
        tracing::debug!(slot = slot.get(), %root, "beacon root committed");
        Ok(())
    }

    fn position(&self, slot: Slot) -> usize {
        (slot.get() % self.retention()) as usize
    }
}

impl BeaconRootSource for InMemoryBeaconRoots {
    fn root_at(&self, slot: Slot) -> Bytes32 {
        match self.entries[self.position(slot)] {
            Some((stored, root)) if stored == slot => root,
            _ => Bytes32::ZERO,
        }
    }
}
