//! # RAID Node
//!
//! Shared handle over one head state machine and its collaborators.
//!
//! All mutable state sits behind a single `parking_lot::Mutex`; every
//! operation takes the lock for its whole duration, so publish calls and
//! administrative changes are strictly serialized. Clones share the same
//! state.

use std::sync::Arc;

use parking_lot::Mutex;
use raid_core::{Address, Bytes32, PublicationId, Slot, Timestamp};

use crate::admin::{AdminCapability, AdminError};
use crate::beacon::{BeaconError, InMemoryBeaconRoots};
use crate::bond::{BondError, BondRegistry, SlashRecord};
use crate::config::{ConfigError, RaidConfig};
use crate::error::PublishError;
use crate::events::RaidEvent;
use crate::head::{
    HeadParams, HeadPhase, HeadState, HeadStateMachine, HeadTransitionRecord, PublishContext,
    PublishReceipt, PublishRequest,
};
use crate::ledger::{Publication, PublicationLedger};

#[derive(Debug)]
struct NodeInner {
    machine: HeadStateMachine,
    ledger: PublicationLedger,
    bonds: BondRegistry,
    roots: InMemoryBeaconRoots,
}

/// Thread-safe, cloneable RAID node.
#[derive(Debug, Clone)]
pub struct RaidNode {
    inner: Arc<Mutex<NodeInner>>,
}

impl RaidNode {
    /// Build a node from a validated configuration. Returns the node and the
    /// initial admin capability.
    pub fn new(config: &RaidConfig) -> Result<(Self, AdminCapability), ConfigError> {
        config.validate()?;
        let roots = InMemoryBeaconRoots::new(config.beacon_root_retention)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let (bonds, slasher) = BondRegistry::new(config.min_collateral, config.treasury);
        let (machine, admin) = HeadStateMachine::new(
            HeadParams {
                default_threshold: config.default_threshold,
                default_slash_amount: config.default_slash_amount,
                max_validator_index: config.max_validator_index,
            },
            slasher,
        );
        let inner = NodeInner {
            machine,
            ledger: PublicationLedger::new(config.max_blob_size, config.publication_fee),
            bonds,
            roots,
        };
        tracing::info!(
            threshold = config.default_threshold,
            min_collateral = config.min_collateral,
            retention = config.beacon_root_retention,
            "raid node initialised"
        );
        Ok((
            Self {
                inner: Arc::new(Mutex::new(inner)),
            },
            admin,
        ))
    }

    // ── Publish ──────────────────────────────────────────────────────

    /// Publish, stamping the record with the current time.
    pub fn publish(&self, request: PublishRequest) -> Result<PublishReceipt, PublishError> {
        self.publish_at(request, Timestamp::now())
    }

    /// Publish with an explicit timestamp.
    pub fn publish_at(
        &self,
        request: PublishRequest,
        at: Timestamp,
    ) -> Result<PublishReceipt, PublishError> {
        let mut guard = self.inner.lock();
        let NodeInner {
            machine,
            ledger,
            bonds,
            roots,
        } = &mut *guard;
        machine.publish(
            PublishContext {
                ledger,
                bonds,
                roots: &*roots,
            },
            request,
            at,
        )
    }

    // ── Bonds and beacon roots ───────────────────────────────────────

    /// Bond collateral for `identity`. Returns the new balance.
    pub fn deposit(&self, identity: Address, amount: u128) -> Result<u128, BondError> {
        self.inner.lock().bonds.deposit(identity, amount)
    }

    /// Withdraw collateral for `identity`. Returns the new balance.
    pub fn withdraw(&self, identity: Address, amount: u128) -> Result<u128, BondError> {
        self.inner.lock().bonds.withdraw(identity, amount)
    }

    /// Make a beacon root available to the verifier.
    pub fn commit_beacon_root(&self, slot: Slot, root: Bytes32) -> Result<(), BeaconError> {
        self.inner.lock().roots.commit(slot, root)
    }

    // ── Admin ────────────────────────────────────────────────────────

    /// Set or clear the pause gate.
    pub fn set_paused(&self, admin: &AdminCapability, paused: bool) -> Result<(), AdminError> {
        self.inner.lock().machine.set_paused(admin, paused)
    }

    /// Change the default threshold.
    pub fn set_default_threshold(
        &self,
        admin: &AdminCapability,
        threshold: u64,
    ) -> Result<(), AdminError> {
        self.inner
            .lock()
            .machine
            .set_default_threshold(admin, threshold)
    }

    /// Change the per-default slash amount.
    pub fn set_default_slash_amount(
        &self,
        admin: &AdminCapability,
        amount: u128,
    ) -> Result<(), AdminError> {
        self.inner
            .lock()
            .machine
            .set_default_slash_amount(admin, amount)
    }

    /// Rotate the admin capability.
    pub fn transfer_admin(&self, admin: &AdminCapability) -> Result<AdminCapability, AdminError> {
        self.inner.lock().machine.transfer_admin(admin)
    }

    /// Take all accrued publication fees.
    pub fn withdraw_fees(&self, admin: &AdminCapability) -> Result<u128, AdminError> {
        let mut inner = self.inner.lock();
        inner.machine.check_admin(admin)?;
        let amount = inner.ledger.withdraw_fees();
        tracing::info!(amount, "publication fees withdrawn");
        Ok(amount)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current heads.
    pub fn heads(&self) -> HeadState {
        self.inner.lock().machine.heads()
    }

    /// Current phase.
    pub fn phase(&self) -> HeadPhase {
        self.inner.lock().machine.phase()
    }

    /// Whether the pause gate is set.
    pub fn is_paused(&self) -> bool {
        self.inner.lock().machine.is_paused()
    }

    /// A committed publication.
    pub fn publication(&self, pid: PublicationId) -> Option<Publication> {
        self.inner.lock().ledger.get(pid).cloned()
    }

    /// Number of committed publications.
    pub fn publication_count(&self) -> usize {
        self.inner.lock().ledger.len()
    }

    /// Defaults recorded for `identity`.
    pub fn defaults_of(&self, identity: Address) -> u64 {
        self.inner.lock().machine.defaults_of(identity)
    }

    /// Bonded collateral of `identity`.
    pub fn collateral_of(&self, identity: Address) -> u128 {
        self.inner.lock().bonds.collateral_of(identity)
    }

    /// Whether `identity` may publish.
    pub fn is_active(&self, identity: Address) -> bool {
        self.inner.lock().bonds.is_active(identity)
    }

    /// Collateral seized into the treasury so far.
    pub fn treasury_balance(&self) -> u128 {
        self.inner.lock().bonds.treasury_balance()
    }

    /// Publication fees accrued and not yet withdrawn.
    pub fn collected_fees(&self) -> u128 {
        self.inner.lock().ledger.collected_fees()
    }

    /// Current default threshold.
    pub fn default_threshold(&self) -> u64 {
        self.inner.lock().machine.default_threshold()
    }

    /// Current per-default slash amount.
    pub fn default_slash_amount(&self) -> u128 {
        self.inner.lock().machine.default_slash_amount()
    }

    /// Snapshot of all events emitted so far.
    pub fn events(&self) -> Vec<RaidEvent> {
        self.inner.lock().machine.events().to_vec()
    }

    /// Take all events emitted so far.
    pub fn drain_events(&self) -> Vec<RaidEvent> {
        self.inner.lock().machine.drain_events()
    }

    /// Snapshot of the head transition log.
    pub fn transition_log(&self) -> Vec<HeadTransitionRecord> {
        self.inner.lock().machine.transition_log().to_vec()
    }

    /// Take the head transition log, leaving it empty.
    pub fn drain_transition_log(&self) -> Vec<HeadTransitionRecord> {
        self.inner.lock().machine.drain_transition_log()
    }

    /// Snapshot of executed slashes.
    pub fn slash_history(&self) -> Vec<SlashRecord> {
        self.inner.lock().bonds.slash_history().to_vec()
    }
}
