//! # Head State Machine
//!
//! Drives the two-pointer head protocol. Every publish call mints a new
//! publication and moves the heads in exactly one of three ways:
//!
//! ```text
//!             genesis (replace=true, no proof)
//!   Genesis ─────────────────────────────────▶ Active
//!                                               │  ▲
//!        replace (proof names someone else) ────┘  │   unsafe := pid
//!        advance (proof names the publisher) ──────┘   safe := unsafe, unsafe := pid
//! ```
//!
//! ## Invariants
//!
//! - `safe_head` only ever takes a value `unsafe_head` held before.
//! - `unsafe_head` strictly increases with every accepted transition.
//! - Once both are non-zero, `safe_head < unsafe_head`.
//! - `safe_head` moves only on advance, never on replace.
//!
//! ## Failure Semantics
//!
//! A publish call is staged: the ledger validates without writing, the
//! transition is computed as a value, and only a fully successful call
//! commits the publication and the new heads. The one exception is a proof
//! failure, which persists its penalty (default counter, and any slash)
//! before returning `InvalidProof`. Everything else about that call,
//! including the staged publication and its fee, is discarded.
//!
//! The slash threshold is strict: with threshold `t`, the `(t+1)`-th default
//! and every later one is slashed.

use raid_core::{Address, PublicationId, Slot, Timestamp};
use raid_crypto::{AttestedProposer, BeaconRootSource, ProofVerifier, VerificationFailure};
use serde::{Deserialize, Serialize};

use crate::admin::{AdminCapability, AdminError, AdminRole};
use crate::bond::{BondRegistry, SlashCapability};
use crate::defaults::DefaultLedger;
use crate::error::PublishError;
use crate::events::RaidEvent;
use crate::ledger::PublicationLedger;

// ─── Head State ──────────────────────────────────────────────────────

/// The two head pointers. `NONE` means "not yet set".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadState {
    /// Last publication promoted to canonical.
    pub safe_head: PublicationId,
    /// Current pending candidate.
    pub unsafe_head: PublicationId,
}

/// Which transitions are currently legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeadPhase {
    /// No candidate yet; only a proofless replace is accepted.
    Genesis,
    /// A candidate exists; replace and advance require a proof.
    Active,
}

impl HeadPhase {
    /// Canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Genesis => "GENESIS",
            Self::Active => "ACTIVE",
        }
    }
}

impl std::fmt::Display for HeadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The head movement performed by an accepted publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadAction {
    /// First candidate installed.
    Genesis,
    /// Pending candidate evicted by a new one.
    Replace,
    /// Pending candidate promoted to safe; new candidate installed.
    Advance,
}

impl HeadState {
    /// Phase implied by the pointers.
    pub fn phase(&self) -> HeadPhase {
        if self.unsafe_head.is_none() {
            HeadPhase::Genesis
        } else {
            HeadPhase::Active
        }
    }

    /// Heads after applying `action` with freshly minted `pid`.
    ///
    /// Returns `None` if the action is not legal in the current phase or
    /// `pid` does not move the unsafe head forward.
    pub fn apply(&self, action: HeadAction, pid: PublicationId) -> Option<HeadState> {
        if pid <= self.unsafe_head {
            return None;
        }
        match (self.phase(), action) {
            (HeadPhase::Genesis, HeadAction::Genesis) | (HeadPhase::Active, HeadAction::Replace) => {
                Some(HeadState {
                    safe_head: self.safe_head,
                    unsafe_head: pid,
                })
            }
            (HeadPhase::Active, HeadAction::Advance) => Some(HeadState {
                safe_head: self.unsafe_head,
                unsafe_head: pid,
            }),
            _ => None,
        }
    }

    /// [`HeadState::apply`], reporting an illegal movement as
    /// [`PublishError::InvalidTransition`].
    pub fn try_apply(
        &self,
        action: HeadAction,
        pid: PublicationId,
    ) -> Result<HeadState, PublishError> {
        self.apply(action, pid)
            .ok_or(PublishError::InvalidTransition {
                phase: self.phase(),
                action,
                pid,
            })
    }
}

// ─── Requests and Records ────────────────────────────────────────────

/// One publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Submitting participant.
    pub caller: Address,
    /// Blob payload. Only its digest is stored.
    pub blob: Vec<u8>,
    /// Beacon slot claimed for the publication.
    pub slot: Slot,
    /// `true` to replace the candidate, `false` to advance it.
    pub replace: bool,
    /// Encoded proof. Ignored at genesis.
    pub proof: Vec<u8>,
    /// Fee attached to the call.
    pub fee_paid: u128,
}

/// Outcome of an accepted publish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// The newly minted publication.
    pub pid: PublicationId,
    /// The head movement performed.
    pub action: HeadAction,
    /// Heads after the call.
    pub heads: HeadState,
    /// Fee overpayment returned to the caller.
    pub refund: u128,
    /// Proposer attested by the proof, absent at genesis.
    pub attested: Option<AttestedProposer>,
}

/// Audit record of one head movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadTransitionRecord {
    /// Heads before.
    pub from: HeadState,
    /// Heads after.
    pub to: HeadState,
    /// Movement performed.
    pub action: HeadAction,
    /// The publication installed as unsafe head.
    pub pid: PublicationId,
    /// Publisher of the new candidate.
    pub publisher: Address,
    /// When the transition was committed.
    pub at: Timestamp,
}

/// Collaborators a publish call reads from and commits to.
pub struct PublishContext<'a> {
    /// Mints publications.
    pub ledger: &'a mut PublicationLedger,
    /// Authorizes callers and executes slashes.
    pub bonds: &'a mut BondRegistry,
    /// Trusted beacon roots.
    pub roots: &'a dyn BeaconRootSource,
}

// ─── The Machine ─────────────────────────────────────────────────────

/// Tunable parameters of the default policy and verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadParams {
    /// Defaults above this count are slashed.
    pub default_threshold: u64,
    /// Amount requested per slash.
    pub default_slash_amount: u128,
    /// Largest validator index a proof may claim.
    pub max_validator_index: u64,
}

/// The head state machine. Owns the heads, the pause gate, the default
/// ledger, and the capability to slash.
#[derive(Debug)]
pub struct HeadStateMachine {
    heads: HeadState,
    paused: bool,
    defaults: DefaultLedger,
    default_threshold: u64,
    default_slash_amount: u128,
    verifier: ProofVerifier,
    slasher: SlashCapability,
    admin: AdminRole,
    events: Vec<RaidEvent>,
    transition_log: Vec<HeadTransitionRecord>,
}

impl HeadStateMachine {
    /// New machine in the genesis phase. Returns the machine and its first
    /// admin capability.
    pub fn new(params: HeadParams, slasher: SlashCapability) -> (Self, AdminCapability) {
        let (admin, capability) = AdminRole::new();
        let machine = Self {
            heads: HeadState::default(),
            paused: false,
            defaults: DefaultLedger::new(),
            default_threshold: params.default_threshold,
            default_slash_amount: params.default_slash_amount,
            verifier: ProofVerifier::new(params.max_validator_index),
            slasher,
            admin,
            events: Vec::new(),
            transition_log: Vec::new(),
        };
        (machine, capability)
    }

    /// Process one publish call.
    pub fn publish(
        &mut self,
        ctx: PublishContext<'_>,
        request: PublishRequest,
        at: Timestamp,
    ) -> Result<PublishReceipt, PublishError> {
        if self.paused {
            return Err(PublishError::ContractPaused);
        }
        if !ctx.bonds.is_active(request.caller) {
            return Err(PublishError::NotPreconfer(request.caller));
        }

        let staged = ctx.ledger.stage(
            request.caller,
            &request.blob,
            request.slot,
            request.fee_paid,
            at,
        )?;
        let pid = staged.id();

        let (action, attested) = match self.heads.phase() {
            HeadPhase::Genesis => {
                if !request.replace {
                    return Err(PublishError::MustReplaceGenesis);
                }
                (HeadAction::Genesis, None)
            }
            HeadPhase::Active => {
                let candidate = self.heads.unsafe_head;
                let prev_publisher = ctx
                    .ledger
                    .get(candidate)
                    .map(|p| p.publisher)
                    .ok_or(PublishError::MissingCandidate(candidate))?;

                let attested = match self.verifier.verify_bytes(&request.proof, ctx.roots) {
                    Ok(attested) => attested,
                    Err(cause) => {
                        return Err(self.record_default(ctx.bonds, request.caller, cause, at))
                    }
                };

                let action = if request.replace {
                    if attested.proposer == prev_publisher {
                        return Err(PublishError::CannotReplaceWithSameProposer {
                            candidate,
                            proposer: attested.proposer,
                        });
                    }
                    HeadAction::Replace
                } else {
                    if attested.proposer != prev_publisher {
                        return Err(PublishError::CannotAdvanceWithDifferentProposer {
                            candidate,
                            publisher: prev_publisher,
                            attested: attested.proposer,
                        });
                    }
                    HeadAction::Advance
                };
                (action, Some(attested))
            }
        };

        let next = self.heads.try_apply(action, pid)?;

        // Commit point: nothing above this line has written state.
        let (pid, refund) = ctx.ledger.commit(staged)?;
        let from = self.heads;
        self.heads = next;

        // On advance the attested proposer is the promoted candidate's publisher.
        if let (HeadAction::Advance, Some(attested)) = (action, &attested) {
            let promoted = from.unsafe_head;
            let proposer = attested.proposer;
            tracing::info!(pid = promoted.get(), %proposer, "safe head advanced");
            self.events.push(RaidEvent::SafeHeadUpdated {
                pid: promoted,
                proposer,
            });
        }
        tracing::info!(
            pid = pid.get(),
            publisher = %request.caller,
            action = ?action,
            "unsafe head updated"
        );
        self.events.push(RaidEvent::UnsafeHeadUpdated {
            pid,
            proposer: request.caller,
        });
        self.transition_log.push(HeadTransitionRecord {
            from,
            to: next,
            action,
            pid,
            publisher: request.caller,
            at,
        });

        Ok(PublishReceipt {
            pid,
            action,
            heads: next,
            refund,
            attested,
        })
    }

    /// Persist the penalty for a rejected proof and build the error.
    fn record_default(
        &mut self,
        bonds: &mut BondRegistry,
        caller: Address,
        cause: VerificationFailure,
        at: Timestamp,
    ) -> PublishError {
        let count = self.defaults.record(caller);
        tracing::warn!(%caller, count, cause = cause.as_str(), "proof rejected, default recorded");
        self.events.push(RaidEvent::ParticipantDefaulted {
            identity: caller,
            count,
        });

        let mut slashed = None;
        if count > self.default_threshold {
            let reason = format!(
                "default #{count} exceeds threshold {}: {}",
                self.default_threshold,
                cause.as_str()
            );
            match bonds.slash(&self.slasher, caller, self.default_slash_amount, reason.clone(), at)
            {
                Ok(seized) => {
                    self.events.push(RaidEvent::ParticipantSlashed {
                        identity: caller,
                        seized,
                        reason,
                    });
                    slashed = Some(seized);
                }
                Err(e) => return PublishError::Slash(e),
            }
        }

        PublishError::InvalidProof {
            caller,
            cause,
            defaults: count,
            slashed,
        }
    }

    // ─── Admin ───────────────────────────────────────────────────────

    /// Check that `capability` holds the admin role.
    pub fn check_admin(&self, capability: &AdminCapability) -> Result<(), AdminError> {
        self.admin.check(capability)
    }

    /// Set or clear the pause gate.
    pub fn set_paused(
        &mut self,
        capability: &AdminCapability,
        paused: bool,
    ) -> Result<(), AdminError> {
        self.admin.check(capability)?;
        self.paused = paused;
        tracing::info!(paused, "pause gate changed");
        self.events.push(RaidEvent::PausedChanged { paused });
        Ok(())
    }

    /// Change the default threshold.
    pub fn set_default_threshold(
        &mut self,
        capability: &AdminCapability,
        threshold: u64,
    ) -> Result<(), AdminError> {
        self.admin.check(capability)?;
        let old = std::mem::replace(&mut self.default_threshold, threshold);
        tracing::info!(old, new = threshold, "default threshold changed");
        self.events.push(RaidEvent::DefaultThresholdChanged {
            old,
            new: threshold,
        });
        Ok(())
    }

    /// Change the per-default slash amount.
    pub fn set_default_slash_amount(
        &mut self,
        capability: &AdminCapability,
        amount: u128,
    ) -> Result<(), AdminError> {
        self.admin.check(capability)?;
        let old = std::mem::replace(&mut self.default_slash_amount, amount);
        tracing::info!(old, new = amount, "default slash amount changed");
        self.events.push(RaidEvent::DefaultSlashAmountChanged { old, new: amount });
        Ok(())
    }

    /// Rotate the admin capability. The presented one stops working.
    pub fn transfer_admin(
        &mut self,
        capability: &AdminCapability,
    ) -> Result<AdminCapability, AdminError> {
        let next = self.admin.rotate(capability)?;
        tracing::info!("admin capability rotated");
        self.events.push(RaidEvent::AdminTransferred);
        Ok(next)
    }

    // ─── Reads ───────────────────────────────────────────────────────

    /// Current heads.
    pub fn heads(&self) -> HeadState {
        self.heads
    }

    /// Current phase.
    pub fn phase(&self) -> HeadPhase {
        self.heads.phase()
    }

    /// Whether the pause gate is set.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Defaults recorded for `identity`.
    pub fn defaults_of(&self, identity: Address) -> u64 {
        self.defaults.count_of(identity)
    }

    /// Current default threshold.
    pub fn default_threshold(&self) -> u64 {
        self.default_threshold
    }

    /// Current per-default slash amount.
    pub fn default_slash_amount(&self) -> u128 {
        self.default_slash_amount
    }

    /// All events emitted so far.
    pub fn events(&self) -> &[RaidEvent] {
        &self.events
    }

    /// Take all events emitted so far.
    pub fn drain_events(&mut self) -> Vec<RaidEvent> {
        std::mem::take(&mut self.events)
    }

    /// Every accepted head movement, oldest first.
    pub fn transition_log(&self) -> &[HeadTransitionRecord] {
        &self.transition_log
    }

    /// Take the transition log, leaving it empty.
    pub fn drain_transition_log(&mut self) -> Vec<HeadTransitionRecord> {
        std::mem::take(&mut self.transition_log)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon::InMemoryBeaconRoots;
    use raid_crypto::{Proof, SortedPairTree};

    const MIN: u128 = 1_000;
    const SLASH: u128 = 100;

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    fn at() -> Timestamp {
        Timestamp::from_epoch_secs(1_780_000_000).unwrap()
    }

    struct Harness {
        machine: HeadStateMachine,
        admin: AdminCapability,
        ledger: PublicationLedger,
        bonds: BondRegistry,
        roots: InMemoryBeaconRoots,
        next_slot: u64,
    }

    impl Harness {
        fn new(threshold: u64) -> Self {
            let (mut bonds, slasher) = BondRegistry::new(MIN, addr(0xee));
            for who in 1..=4 {
                bonds.deposit(addr(who), 10 * MIN).unwrap();
            }
            let (machine, admin) = HeadStateMachine::new(
                HeadParams {
                    default_threshold: threshold,
                    default_slash_amount: SLASH,
                    max_validator_index: 1_000,
                },
                slasher,
            );
            Self {
                machine,
                admin,
                ledger: PublicationLedger::new(1024, 0),
                bonds,
                roots: InMemoryBeaconRoots::new(64).unwrap(),
                next_slot: 1,
            }
        }

        /// Commit a beacon root at `slot` whose tree contains `proposer`,
        /// and return a valid encoded proof for it.
        fn proof_for(&mut self, slot: u64, proposer: Address) -> Vec<u8> {
            let tree = SortedPairTree::from_addresses(&[proposer, addr(0x77), addr(0x78)]).unwrap();
            self.roots.commit(Slot(slot), tree.root()).unwrap();
            Proof {
                slot: Slot(slot),
                proposer_index: 5,
                proposer,
                branch: tree.branch(0).unwrap(),
            }
            .encode()
        }

        fn publish(
            &mut self,
            caller: Address,
            replace: bool,
            proof: Vec<u8>,
        ) -> Result<PublishReceipt, PublishError> {
            let slot = self.next_slot;
            self.next_slot += 1;
            self.machine.publish(
                PublishContext {
                    ledger: &mut self.ledger,
                    bonds: &mut self.bonds,
                    roots: &self.roots,
                },
                PublishRequest {
                    caller,
                    blob: vec![slot as u8; 8],
                    slot: Slot(slot),
                    replace,
                    proof,
                    fee_paid: 0,
                },
                at(),
            )
        }
    }

    // ── HeadState::apply ─────────────────────────────────────────────

    #[test]
    fn test_apply_genesis_only_from_genesis() {
        let h = HeadState::default();
        assert_eq!(h.phase(), HeadPhase::Genesis);
        assert_eq!(
            h.apply(HeadAction::Genesis, PublicationId(1)),
            Some(HeadState {
                safe_head: PublicationId::NONE,
                unsafe_head: PublicationId(1)
            })
        );
        assert_eq!(h.apply(HeadAction::Replace, PublicationId(1)), None);
        assert_eq!(h.apply(HeadAction::Advance, PublicationId(1)), None);
    }

    #[test]
    fn test_apply_active_transitions() {
        let h = HeadState {
            safe_head: PublicationId(1),
            unsafe_head: PublicationId(2),
        };
        assert_eq!(h.apply(HeadAction::Genesis, PublicationId(3)), None);
        assert_eq!(
            h.apply(HeadAction::Replace, PublicationId(3)).unwrap(),
            HeadState {
                safe_head: PublicationId(1),
                unsafe_head: PublicationId(3)
            }
        );
        assert_eq!(
            h.apply(HeadAction::Advance, PublicationId(3)).unwrap(),
            HeadState {
                safe_head: PublicationId(2),
                unsafe_head: PublicationId(3)
            }
        );
    }

    #[test]
    fn test_apply_rejects_non_increasing_pid() {
        let h = HeadState {
            safe_head: PublicationId::NONE,
            unsafe_head: PublicationId(5),
        };
        assert_eq!(h.apply(HeadAction::Replace, PublicationId(5)), None);
        assert_eq!(h.apply(HeadAction::Advance, PublicationId(4)), None);
    }

    #[test]
    fn test_try_apply_reports_invalid_transition() {
        let genesis = HeadState::default();
        assert_eq!(
            genesis.try_apply(HeadAction::Advance, PublicationId(1)),
            Err(PublishError::InvalidTransition {
                phase: HeadPhase::Genesis,
                action: HeadAction::Advance,
                pid: PublicationId(1),
            })
        );
        let active = HeadState {
            safe_head: PublicationId(2),
            unsafe_head: PublicationId(3),
        };
        let err = active
            .try_apply(HeadAction::Replace, PublicationId(3))
            .unwrap_err();
        assert!(matches!(
            err,
            PublishError::InvalidTransition {
                phase: HeadPhase::Active,
                ..
            }
        ));
        assert_eq!(
            active.try_apply(HeadAction::Advance, PublicationId(4)),
            Ok(HeadState {
                safe_head: PublicationId(3),
                unsafe_head: PublicationId(4),
            })
        );
    }

    // ── Genesis ──────────────────────────────────────────────────────

    #[test]
    fn test_genesis_requires_replace() {
        let mut h = Harness::new(3);
        assert_eq!(
            h.publish(addr(1), false, vec![]).unwrap_err(),
            PublishError::MustReplaceGenesis
        );
        assert!(h.ledger.is_empty());
        assert_eq!(h.machine.heads(), HeadState::default());
    }

    #[test]
    fn test_genesis_ignores_proof() {
        let mut h = Harness::new(3);
        let r = h.publish(addr(1), true, b"garbage".to_vec()).unwrap();
        assert_eq!(r.action, HeadAction::Genesis);
        assert_eq!(r.pid, PublicationId(1));
        assert_eq!(r.heads.unsafe_head, PublicationId(1));
        assert_eq!(r.heads.safe_head, PublicationId::NONE);
        assert!(r.attested.is_none());
        assert_eq!(h.machine.defaults_of(addr(1)), 0);
        assert_eq!(
            h.machine.events(),
            &[RaidEvent::UnsafeHeadUpdated {
                pid: PublicationId(1),
                proposer: addr(1)
            }]
        );
    }

    // ── Replace ──────────────────────────────────────────────────────

    #[test]
    fn test_replace_with_different_proposer() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let proof = h.proof_for(40, addr(2));
        let r = h.publish(addr(2), true, proof).unwrap();
        assert_eq!(r.action, HeadAction::Replace);
        assert_eq!(r.heads.unsafe_head, PublicationId(2));
        assert_eq!(r.heads.safe_head, PublicationId::NONE);
        assert_eq!(r.attested.unwrap().proposer, addr(2));
    }

    #[test]
    fn test_replace_with_same_proposer_rejected() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let proof = h.proof_for(40, addr(1));
        assert_eq!(
            h.publish(addr(1), true, proof).unwrap_err(),
            PublishError::CannotReplaceWithSameProposer {
                candidate: PublicationId(1),
                proposer: addr(1)
            }
        );
        assert_eq!(h.ledger.len(), 1);
        assert_eq!(h.machine.defaults_of(addr(1)), 0);
    }

    #[test]
    fn test_replace_compares_attested_not_caller() {
        // Caller 2 submits a proof naming 1, the candidate's publisher.
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let proof = h.proof_for(40, addr(1));
        assert!(matches!(
            h.publish(addr(2), true, proof),
            Err(PublishError::CannotReplaceWithSameProposer { .. })
        ));
    }

    // ── Advance ──────────────────────────────────────────────────────

    #[test]
    fn test_advance_promotes_candidate() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let proof = h.proof_for(40, addr(1));
        let r = h.publish(addr(3), false, proof).unwrap();
        assert_eq!(r.action, HeadAction::Advance);
        assert_eq!(
            r.heads,
            HeadState {
                safe_head: PublicationId(1),
                unsafe_head: PublicationId(2)
            }
        );
        let events = h.machine.events();
        assert_eq!(
            events[events.len() - 2],
            RaidEvent::SafeHeadUpdated {
                pid: PublicationId(1),
                proposer: addr(1)
            }
        );
        assert_eq!(
            events[events.len() - 1],
            RaidEvent::UnsafeHeadUpdated {
                pid: PublicationId(2),
                proposer: addr(3)
            }
        );
    }

    #[test]
    fn test_advance_with_different_proposer_rejected() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let proof = h.proof_for(40, addr(2));
        assert_eq!(
            h.publish(addr(1), false, proof).unwrap_err(),
            PublishError::CannotAdvanceWithDifferentProposer {
                candidate: PublicationId(1),
                publisher: addr(1),
                attested: addr(2)
            }
        );
        assert_eq!(h.machine.heads().safe_head, PublicationId::NONE);
    }

    #[test]
    fn test_replace_never_moves_safe_head() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let p = h.proof_for(40, addr(1));
        h.publish(addr(1), false, p).unwrap();
        assert_eq!(h.machine.heads().safe_head, PublicationId(1));
        let p = h.proof_for(41, addr(2));
        let r = h.publish(addr(2), true, p).unwrap();
        assert_eq!(r.heads.safe_head, PublicationId(1));
        assert_eq!(r.heads.unsafe_head, PublicationId(3));
    }

    // ── Defaults and slashing ────────────────────────────────────────

    #[test]
    fn test_invalid_proof_records_default_without_minting() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let err = h.publish(addr(2), true, vec![1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            PublishError::InvalidProof {
                cause: VerificationFailure::Malformed(_),
                defaults: 1,
                slashed: None,
                ..
            }
        ));
        assert_eq!(h.machine.defaults_of(addr(2)), 1);
        assert_eq!(h.ledger.len(), 1);
        assert_eq!(h.machine.heads().unsafe_head, PublicationId(1));
    }

    #[test]
    fn test_missing_root_is_default() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let proof = Proof {
            slot: Slot(63),
            proposer_index: 1,
            proposer: addr(1),
            branch: vec![],
        };
        let err = h.publish(addr(2), false, proof.encode()).unwrap_err();
        assert!(matches!(
            err,
            PublishError::InvalidProof {
                cause: VerificationFailure::InvalidBeaconRoot { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_index_bound_is_default() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let mut proof = Proof::decode(&h.proof_for(40, addr(1))).unwrap();
        proof.proposer_index = 1_001;
        assert!(matches!(
            h.publish(addr(2), false, proof.encode()),
            Err(PublishError::InvalidProof {
                cause: VerificationFailure::InvalidProposerIndex { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_slash_on_first_default_above_threshold() {
        let mut h = Harness::new(2);
        h.publish(addr(1), true, vec![]).unwrap();
        let mut slashes = 0;
        for i in 1..=3u64 {
            let err = h.publish(addr(2), true, vec![0xff]).unwrap_err();
            match err {
                PublishError::InvalidProof {
                    defaults, slashed, ..
                } => {
                    assert_eq!(defaults, i);
                    if i < 3 {
                        assert_eq!(slashed, None);
                    } else {
                        assert_eq!(slashed, Some(SLASH));
                        slashes += 1;
                    }
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(slashes, 1);
        assert_eq!(h.bonds.collateral_of(addr(2)), 10 * MIN - SLASH);
        assert_eq!(h.bonds.treasury_balance(), SLASH);
        let slashed_events = h
            .machine
            .events()
            .iter()
            .filter(|e| matches!(e, RaidEvent::ParticipantSlashed { .. }))
            .count();
        assert_eq!(slashed_events, 1);
    }

    #[test]
    fn test_every_default_past_threshold_slashed() {
        let mut h = Harness::new(2);
        h.publish(addr(1), true, vec![]).unwrap();
        for i in 1..=5u64 {
            match h.publish(addr(2), true, vec![0xff]).unwrap_err() {
                PublishError::InvalidProof {
                    defaults, slashed, ..
                } => {
                    assert_eq!(defaults, i);
                    let expected = if i > 2 { Some(SLASH) } else { None };
                    assert_eq!(slashed, expected, "default {i}");
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(h.bonds.collateral_of(addr(2)), 10 * MIN - 3 * SLASH);
        assert_eq!(h.bonds.treasury_balance(), 3 * SLASH);
        let slashed_events = h
            .machine
            .events()
            .iter()
            .filter(|e| matches!(e, RaidEvent::ParticipantSlashed { .. }))
            .count();
        assert_eq!(slashed_events, 3);
    }

    #[test]
    fn test_default_three_not_slashed_with_threshold_three() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        for _ in 0..3 {
            h.publish(addr(2), true, vec![]).unwrap_err();
        }
        assert_eq!(h.bonds.treasury_balance(), 0);
        h.publish(addr(2), true, vec![]).unwrap_err();
        assert_eq!(h.bonds.treasury_balance(), SLASH);
    }

    #[test]
    fn test_slash_capped_at_collateral() {
        let mut h = Harness::new(0);
        h.machine
            .set_default_slash_amount(&h.admin, 100 * MIN)
            .unwrap();
        h.publish(addr(1), true, vec![]).unwrap();
        let err = h.publish(addr(2), true, vec![]).unwrap_err();
        assert!(matches!(
            err,
            PublishError::InvalidProof {
                slashed: Some(s),
                ..
            } if s == 10 * MIN
        ));
        assert_eq!(h.bonds.collateral_of(addr(2)), 0);
        // Fully slashed participant is no longer a preconfer.
        assert_eq!(
            h.publish(addr(2), true, vec![]).unwrap_err(),
            PublishError::NotPreconfer(addr(2))
        );
    }

    #[test]
    fn test_ledger_rejection_is_not_default() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let err = h
            .machine
            .publish(
                PublishContext {
                    ledger: &mut h.ledger,
                    bonds: &mut h.bonds,
                    roots: &h.roots,
                },
                PublishRequest {
                    caller: addr(2),
                    blob: vec![0; 2048],
                    slot: Slot(99),
                    replace: true,
                    proof: vec![],
                    fee_paid: 0,
                },
                at(),
            )
            .unwrap_err();
        assert_eq!(err.code(), "BlobTooLarge");
        assert_eq!(h.machine.defaults_of(addr(2)), 0);
    }

    // ── Preconditions and admin ──────────────────────────────────────

    #[test]
    fn test_unbonded_caller_rejected() {
        let mut h = Harness::new(3);
        assert_eq!(
            h.publish(addr(9), true, vec![]).unwrap_err(),
            PublishError::NotPreconfer(addr(9))
        );
    }

    #[test]
    fn test_pause_gate() {
        let mut h = Harness::new(3);
        h.machine.set_paused(&h.admin, true).unwrap();
        assert_eq!(
            h.publish(addr(1), true, vec![]).unwrap_err(),
            PublishError::ContractPaused
        );
        h.machine.set_paused(&h.admin, false).unwrap();
        assert!(h.publish(addr(1), true, vec![]).is_ok());
    }

    #[test]
    fn test_admin_rotation() {
        let mut h = Harness::new(3);
        let next = h.machine.transfer_admin(&h.admin).unwrap();
        assert_eq!(
            h.machine.set_paused(&h.admin, true).unwrap_err(),
            AdminError::NotAdmin
        );
        h.machine.set_default_threshold(&next, 9).unwrap();
        assert_eq!(h.machine.default_threshold(), 9);
        assert!(h
            .machine
            .events()
            .contains(&RaidEvent::DefaultThresholdChanged { old: 3, new: 9 }));
    }

    #[test]
    fn test_transition_log() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let p = h.proof_for(40, addr(1));
        h.publish(addr(2), false, p).unwrap();
        let log = h.machine.transition_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, HeadAction::Genesis);
        assert_eq!(log[1].action, HeadAction::Advance);
        assert_eq!(log[1].from.unsafe_head, PublicationId(1));
        assert_eq!(log[1].to.safe_head, PublicationId(1));
        assert_eq!(log[1].pid, PublicationId(2));
        assert_eq!(log[1].publisher, addr(2));
    }

    #[test]
    fn test_drain_transition_log() {
        let mut h = Harness::new(3);
        h.publish(addr(1), true, vec![]).unwrap();
        let drained = h.machine.drain_transition_log();
        assert_eq!(drained.len(), 1);
        assert!(h.machine.transition_log().is_empty());
        let p = h.proof_for(40, addr(1));
        h.publish(addr(3), false, p).unwrap();
        let log = h.machine.transition_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, HeadAction::Advance);
    }
}
