//! # raid-core — Foundational Types for RAID
//!
//! Leaf crate of the workspace. Defines the primitive types every other
//! crate speaks in, so that a beacon slot can never be passed where a
//! publication id is expected and a 20-byte participant address can never be
//! confused with a 32-byte commitment.
//!
//! ## Key Types
//!
//! - [`Address`]: 20-byte execution-layer identity of a preconfer or proposer.
//! - [`Bytes32`]: 32-byte commitment (beacon roots, Merkle nodes, blob digests).
//! - [`PublicationId`]: ledger-assigned publication id; `0` means "none".
//! - [`Slot`]: beacon-chain slot number.
//! - [`Timestamp`]: UTC-only timestamp truncated to seconds.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `raid-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod hex;
pub mod identity;
pub mod temporal;

pub use error::{HexError, RaidError};
pub use identity::{Address, Bytes32, PublicationId, Slot};
pub use temporal::Timestamp;
