//! # Error Types
//!
//! Errors shared across the workspace. Component-specific failures
//! (ledger, bonds, proofs, head transitions) live next to the component that
//! raises them; this module only holds what the primitive types can fail on.

use thiserror::Error;

/// Top-level error for primitive parsing in RAID.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RaidError {
    /// Timestamp input was malformed or not UTC.
    #[error("timestamp error: {0}")]
    Timestamp(String),
}

/// Error decoding a hex string into bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    /// Decoded length does not match the fixed-width target.
    #[error("expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required byte length.
        expected: usize,
        /// Byte length of the input.
        got: usize,
    },

    /// Input had an odd number of hex digits.
    #[error("odd number of hex digits ({0})")]
    OddLength(usize),

    /// A non-hex character was found.
    #[error("invalid hex character {found:?} at position {position}")]
    InvalidChar {
        /// The offending character.
        found: char,
        /// Character offset, not counting any `0x` prefix.
        position: usize,
    },
}
