//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers RAID passes between components.
//!
//! ## Security Invariant
//!
//! Each namespace is its own type. A `Slot` (beacon-chain time) cannot be
//! substituted for a `PublicationId` (ledger order), and an `Address`
//! (20 bytes) cannot be substituted for a `Bytes32` commitment. Proof
//! verification compares these values directly, so a silent mix-up would be
//! a safety bug rather than a type error.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::HexError;
use crate::hex;

/// Implements hex rendering, parsing, and string serde for a fixed-width
/// byte newtype.
macro_rules! impl_fixed_bytes {
    ($name:ident, $len:expr) => {
        impl $name {
            /// Byte width of this type.
            pub const LEN: usize = $len;

            /// The all-zero value.
            pub const ZERO: Self = Self([0u8; $len]);

            /// Wrap raw bytes.
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Borrow the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Whether every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Render as `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                hex::encode_prefixed(&self.0)
            }

            /// Parse from hex, with or without `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self, HexError> {
                hex::decode_fixed::<$len>(s).map(Self)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl std::str::FromStr for $name {
            type Err = HexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Execution-layer identity (20 bytes) of a preconfer, proposer, or treasury.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

/// A 32-byte commitment: beacon block root, Merkle node, or blob digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bytes32(pub [u8; 32]);

impl_fixed_bytes!(Address, 20);
impl_fixed_bytes!(Bytes32, 32);

impl Address {
    /// Right-align the address into a 32-byte word (12 leading zero bytes).
    pub fn to_word(&self) -> Bytes32 {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        Bytes32(word)
    }
}

/// Ledger-assigned publication id. Ids start at 1; `0` means "none".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PublicationId(pub u64);

impl PublicationId {
    /// The "no publication" sentinel.
    pub const NONE: Self = Self(0);

    /// Whether this is the "no publication" sentinel.
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// The raw id.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The id that follows this one, or `None` on overflow.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl std::fmt::Display for PublicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pub:{}", self.0)
    }
}

/// Beacon-chain slot number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Slot(pub u64);

impl Slot {
    /// The raw slot number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot:{}", self.0)
    }
}
