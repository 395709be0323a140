//! Lowercase hex encoding with optional `0x` prefix on input.

use crate::error::HexError;

/// Encode bytes as lowercase hex without a prefix.
pub fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Encode bytes as lowercase hex with a `0x` prefix.
pub fn encode_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", encode(bytes))
}

/// Decode a hex string of any even length. A leading `0x`/`0X` is accepted.
pub fn decode(input: &str) -> Result<Vec<u8>, HexError> {
    let s = strip_prefix(input.trim());
    if s.len() % 2 != 0 {
        return Err(HexError::OddLength(s.len()));
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let chars: Vec<char> = s.chars().collect();
    for (i, pair) in chars.chunks(2).enumerate() {
        let hi = nibble(pair[0], i * 2)?;
        let lo = nibble(pair[1], i * 2 + 1)?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

/// Decode a hex string into exactly `N` bytes.
pub fn decode_fixed<const N: usize>(input: &str) -> Result<[u8; N], HexError> {
    let bytes = decode(input)?;
    if bytes.len() != N {
        return Err(HexError::InvalidLength {
            expected: N,
            got: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

fn strip_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

fn nibble(c: char, position: usize) -> Result<u8, HexError> {
    c.to_digit(16)
        .map(|d| d as u8)
        .ok_or(HexError::InvalidChar { found: c, position })
}
