//! Decoding of `BIT(n)` wire values.
//!
//! The client delivers bit fields either as raw bytes or as a string in
//! which every character carries one byte in its low eight bits. Both are
//! big-endian. `BIT(64)` is the widest column MySQL allows, so a `u64`
//! accumulator always suffices for well-formed input.

use tracing::warn;

use crate::value::Value;

/// Widest bit field in bytes.
pub const MAX_BIT_FIELD_BYTES: usize = 8;

/// Decodes a big-endian byte sequence into an unsigned integer.
///
/// Returns 0 (with a diagnostic) for sequences longer than
/// [`MAX_BIT_FIELD_BYTES`].
#[must_use]
pub fn decode_bytes(bytes: &[u8]) -> u64 {
    if bytes.len() > MAX_BIT_FIELD_BYTES {
        warn!(len = bytes.len(), "bit field wider than 64 bits, decoding as 0");
        return 0;
    }
    bytes
        .iter()
        .fold(0_u64, |acc, &byte| acc * 256 + u64::from(byte))
}

/// Decodes a string whose characters each carry one byte.
#[must_use]
pub fn decode_chars(raw: &str) -> u64 {
    let bytes: Vec<u8> = raw.chars().map(|c| (u32::from(c) & 0xFF) as u8).collect();
    decode_bytes(&bytes)
}

/// Decodes a bit-field wire value.
///
/// Bytes and text are decoded; anything else is logged and decoded as 0.
#[must_use]
pub fn decode(raw: &Value) -> u64 {
    match raw {
        Value::Bytes(bytes) => decode_bytes(bytes),
        Value::Text(text) => decode_chars(text),
        other => {
            warn!(value = ?other, "unrecognized bit field value, decoding as 0");
            0
        }
    }
}
