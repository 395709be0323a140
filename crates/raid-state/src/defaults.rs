//! # Default Ledger
//!
//! Per-participant count of rejected proofs. Counters only ever grow; there
//! is no reset path.

use std::collections::BTreeMap;

use raid_core::Address;

/// Monotone failure counters keyed by participant.
#[derive(Debug, Clone, Default)]
pub struct DefaultLedger {
    counts: BTreeMap<Address, u64>,
}

impl DefaultLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more default for `identity`. Returns the new count.
    pub fn record(&mut self, identity: Address) -> u64 {
        let count = self.counts.entry(identity).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Defaults recorded for `identity`.
    pub fn count_of(&self, identity: Address) -> u64 {
        self.counts.get(&identity).copied().unwrap_or(0)
    }

    /// Participants with at least one default, in address order.
    pub fn iter(&self) -> impl Iterator<Item = (Address, u64)> + '_ {
        self.counts.iter().map(|(a, c)| (*a, *c))
    }
}
