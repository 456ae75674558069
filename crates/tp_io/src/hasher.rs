//! crates/tp_io/src/hasher.rs
//! SHA-256 hashing for the hash-chained event store (C3, spec §4.3):
//! `hash = H(tick || stream_canonical || previous_hash || payload)`.
//! Deterministic: same bytes in, same 32-byte digest out, on every
//! platform.

use digest::Digest;
use sha2::Sha256;

use tp_core::ids::{CanonicalTick, StreamIdentity};

/// Compute the SHA-256 digest of `bytes`.
pub fn sha256(bytes: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().to_vec()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(sha256(bytes))
}

/// The event store's chain hash formula (spec §4.3): mixes `tick`, the
/// stream's canonical string form, `previous_hash`, and the event's
/// hash-excluded payload bytes, in that fixed order.
pub fn chain_hash(
    tick: CanonicalTick,
    stream: &StreamIdentity,
    previous_hash: &[u8],
    payload: &[u8],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + stream.canonical().len() + previous_hash.len() + payload.len());
    buf.extend_from_slice(&tick.get().to_le_bytes());
    buf.extend_from_slice(stream.canonical().as_bytes());
    buf.extend_from_slice(previous_hash);
    buf.extend_from_slice(payload);
    sha256(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic() {
        assert_eq!(sha256(b"hello"), sha256(b"hello"));
        assert_ne!(sha256(b"hello"), sha256(b"world"));
    }

    #[test]
    fn chain_hash_changes_with_any_input() {
        let stream = StreamIdentity::new("science", "trunk", 1, "geo.plates", "0").unwrap();
        let base = chain_hash(CanonicalTick::from(10), &stream, b"", b"payload-a");
        let diff_tick = chain_hash(CanonicalTick::from(11), &stream, b"", b"payload-a");
        let diff_prev = chain_hash(CanonicalTick::from(10), &stream, b"x", b"payload-a");
        let diff_payload = chain_hash(CanonicalTick::from(10), &stream, b"", b"payload-b");
        assert_ne!(base, diff_tick);
        assert_ne!(base, diff_prev);
        assert_ne!(base, diff_payload);
    }

    #[test]
    fn hex_encoding_is_lowercase_64_chars() {
        let h = sha256_hex(b"anything");
        assert_eq!(h.len(), 64);
        assert!(h.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    }
}
