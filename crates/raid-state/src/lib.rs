//! # raid-state — Head Advancement State Machine
//!
//! The RAID head protocol: bonded participants publish blobs into a
//! [`PublicationLedger`], and the [`HeadStateMachine`] maintains two
//! pointers over those publications. The *unsafe* head is the pending
//! candidate; the *safe* head is the last candidate promoted to canonical.
//!
//! Every publish after genesis carries a beacon-chain proof naming the
//! proposer of some slot. A proof naming someone other than the candidate's
//! publisher lets the caller *replace* the candidate; a proof naming the
//! candidate's publisher lets the caller *advance* it to safe. Callers whose
//! proofs fail verification accumulate defaults and, past a threshold, are
//! slashed through the [`BondRegistry`].
//!
//! ## Modules
//!
//! - [`head`]: the state machine and its transition records.
//! - [`ledger`]: staged publication minting.
//! - [`bond`]: collateral, activity, and capability-gated slashing.
//! - [`beacon`]: in-memory beacon root ring buffer.
//! - [`defaults`]: per-participant default counters.
//! - [`events`]: observable notifications.
//! - [`admin`]: the admin capability.
//! - [`config`]: node parameters, YAML and environment loading.
//! - [`node`]: the mutex-guarded [`RaidNode`] handle.
//! - [`error`]: [`PublishError`] and its classification.

pub mod admin;
pub mod beacon;
pub mod bond;
pub mod config;
pub mod defaults;
pub mod error;
pub mod events;
pub mod head;
pub mod ledger;
pub mod node;

pub use admin::{AdminCapability, AdminError, AdminRole};
pub use beacon::{BeaconError, InMemoryBeaconRoots};
pub use bond::{BondError, BondRegistry, SlashCapability, SlashRecord};
pub use config::{ConfigError, RaidConfig, MAX_BEACON_ROOT_RETENTION};
pub use defaults::DefaultLedger;
pub use error::{ErrorKind, PublishError};
pub use events::RaidEvent;
pub use head::{
    HeadAction, HeadParams, HeadPhase, HeadState, HeadStateMachine, HeadTransitionRecord,
    PublishContext, PublishReceipt, PublishRequest,
};
pub use ledger::{LedgerError, Publication, PublicationLedger, StagedPublication};
pub use node::RaidNode;
