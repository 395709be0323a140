//! # SHA-256 Helpers
//!
//! Every hash in RAID (blob digests, Merkle leaves, Merkle nodes) is plain
//! SHA-256 returned as a [`Bytes32`].

use raid_core::Bytes32;
use sha2::{Digest, Sha256};

/// SHA-256 of arbitrary bytes.
pub fn sha256(data: &[u8]) -> Bytes32 {
    let hash = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    Bytes32(out)
}

/// SHA-256 of `left || right`. Order is the caller's responsibility.
pub fn sha256_pair(left: &Bytes32, right: &Bytes32) -> Bytes32 {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Bytes32(out)
}
