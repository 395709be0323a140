//! # Notifications
//!
//! Observable events emitted by the head state machine. Nothing inside the
//! core consumes them; they exist for indexers, operators, and tests.

use raid_core::{Address, PublicationId};
use serde::{Deserialize, Serialize};

/// An observable state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RaidEvent {
    /// A new pending candidate was installed.
    UnsafeHeadUpdated {
        /// The new unsafe head.
        pid: PublicationId,
        /// Its publisher.
        proposer: Address,
    },
    /// A candidate was promoted to canonical.
    SafeHeadUpdated {
        /// The new safe head.
        pid: PublicationId,
        /// Its publisher.
        proposer: Address,
    },
    /// A participant's proof was rejected.
    ParticipantDefaulted {
        /// The defaulting participant.
        identity: Address,
        /// Its default count after this failure.
        count: u64,
    },
    /// Collateral was seized for repeated defaults.
    ParticipantSlashed {
        /// The slashed participant.
        identity: Address,
        /// Amount seized.
        seized: u128,
        /// Reason passed to the bond registry.
        reason: String,
    },
    /// The pause gate changed.
    PausedChanged {
        /// New value.
        paused: bool,
    },
    /// The admin capability was rotated.
    AdminTransferred,
    /// The default threshold changed.
    DefaultThresholdChanged {
        /// Previous value.
        old: u64,
        /// New value.
        new: u64,
    },
    /// The per-default slash amount changed.
    DefaultSlashAmountChanged {
        /// Previous value.
        old: u128,
        /// New value.
        new: u128,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_json() {
        let e = RaidEvent::SafeHeadUpdated {
            pid: PublicationId(3),
            proposer: Address([0x0f; 20]),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["event"], "safe_head_updated");
        assert_eq!(json["pid"], 3);
    }
}
