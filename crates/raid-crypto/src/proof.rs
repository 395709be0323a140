//! # Proposer Proof Wire Format
//!
//! A publish call carries its proof as opaque bytes. The layout is fixed,
//! big-endian, and self-delimiting:
//!
//! ```text
//! offset  size        field
//! 0       8           slot            (u64)
//! 8       8           proposer_index  (u64)
//! 16      20          proposer        (address)
//! 36      4           branch_len      (u32, at most MAX_BRANCH_DEPTH)
//! 40      32 * len    branch          (sibling hashes, leaf to root)
//! ```
//!
//! Any deviation (short input, oversized branch, trailing bytes) is a
//! [`ProofDecodeError`]. The head state machine treats a decode error exactly
//! like any other verification failure.

use raid_core::{Address, Bytes32, Slot};
use serde::{Deserialize, Serialize};

use crate::error::ProofDecodeError;

/// Deepest branch a proof may declare. Beacon state multi-proofs are well
/// under this; anything deeper is rejected before allocating.
pub const MAX_BRANCH_DEPTH: usize = 64;

const HEADER_LEN: usize = 8 + 8 + 20 + 4;

/// A decoded proposer proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Beacon slot the proof attests to.
    pub slot: Slot,
    /// Claimed validator index of the slot's proposer.
    pub proposer_index: u64,
    /// Claimed execution-layer identity of the slot's proposer.
    pub proposer: Address,
    /// Sibling hashes from the proposer leaf up to the slot's beacon root.
    pub branch: Vec<Bytes32>,
}

impl Proof {
    /// Serialize to the wire layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + 32 * self.branch.len());
        out.extend_from_slice(&self.slot.0.to_be_bytes());
        out.extend_from_slice(&self.proposer_index.to_be_bytes());
        out.extend_from_slice(self.proposer.as_bytes());
        out.extend_from_slice(&(self.branch.len() as u32).to_be_bytes());
        for node in &self.branch {
            out.extend_from_slice(node.as_bytes());
        }
        out
    }

    /// Parse the wire layout.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProofDecodeError> {
        let mut reader = Reader { bytes, offset: 0 };
        let slot = Slot(u64::from_be_bytes(reader.take::<8>()?));
        let proposer_index = u64::from_be_bytes(reader.take::<8>()?);
        let proposer = Address(reader.take::<20>()?);
        let depth = u32::from_be_bytes(reader.take::<4>()?) as usize;
        if depth > MAX_BRANCH_DEPTH {
            return Err(ProofDecodeError::BranchTooDeep {
                depth,
                max: MAX_BRANCH_DEPTH,
            });
        }
        let mut branch = Vec::with_capacity(depth);
        for _ in 0..depth {
            branch.push(Bytes32(reader.take::<32>()?));
        }
        let trailing = reader.remaining();
        if trailing != 0 {
            return Err(ProofDecodeError::TrailingBytes(trailing));
        }
        Ok(Self {
            slot,
            proposer_index,
            proposer,
            branch,
        })
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], ProofDecodeError> {
        let available = self.remaining();
        if available < N {
            return Err(ProofDecodeError::Truncated {
                offset: self.offset,
                needed: N,
                available,
            });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.offset..self.offset + N]);
        self.offset += N;
        Ok(out)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Proof {
        Proof {
            slot: Slot(9_000_001),
            proposer_index: 123_456,
            proposer: Address([0xaa; 20]),
            branch: vec![Bytes32([1; 32]), Bytes32([2; 32])],
        }
    }

    #[test]
    fn test_encode_layout() {
        let bytes = sample().encode();
        assert_eq!(bytes.len(), HEADER_LEN + 64);
        assert_eq!(&bytes[0..8], &9_000_001u64.to_be_bytes());
        assert_eq!(&bytes[8..16], &123_456u64.to_be_bytes());
        assert_eq!(&bytes[16..36], &[0xaa; 20]);
        assert_eq!(&bytes[36..40], &2u32.to_be_bytes());
        assert_eq!(&bytes[40..72], &[1; 32]);
    }

    #[test]
    fn test_decode_recovers_fields() {
        let p = sample();
        assert_eq!(Proof::decode(&p.encode()).unwrap(), p);
    }

    #[test]
    fn test_empty_input_truncated() {
        assert_eq!(
            Proof::decode(&[]).unwrap_err(),
            ProofDecodeError::Truncated {
                offset: 0,
                needed: 8,
                available: 0
            }
        );
    }

    #[test]
    fn test_short_branch_truncated() {
        let mut bytes = sample().encode();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            Proof::decode(&bytes).unwrap_err(),
            ProofDecodeError::Truncated { offset: 72, needed: 32, available: 31 }
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample().encode();
        bytes.push(0);
        assert_eq!(
            Proof::decode(&bytes).unwrap_err(),
            ProofDecodeError::TrailingBytes(1)
        );
    }

    #[test]
    fn test_excessive_depth_rejected_before_reading_branch() {
        let mut bytes = sample().encode();
        bytes[36..40].copy_from_slice(&u32::MAX.to_be_bytes());
        assert_eq!(
            Proof::decode(&bytes).unwrap_err(),
            ProofDecodeError::BranchTooDeep {
                depth: u32::MAX as usize,
                max: MAX_BRANCH_DEPTH
            }
        );
    }

    #[test]
    fn test_empty_branch_allowed() {
        let p = Proof {
            branch: vec![],
            ..sample()
        };
        let bytes = p.encode();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(Proof::decode(&bytes).unwrap(), p);
    }

    #[test]
    fn test_serde_json_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["slot"], 9_000_001);
        assert_eq!(json["proposer"], format!("0x{}", "aa".repeat(20)));
    }
}
