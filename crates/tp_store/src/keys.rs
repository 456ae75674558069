//! crates/tp_store/src/keys.rs
//! The persisted keyspace (spec §4.3, §4.4, §6.5):
//!
//! ```text
//! Event:    {stream_canonical}:E:{sequence:020d}
//! Snapshot: {stream_canonical}:SNAP:{tick:020d}
//! ```
//!
//! Sequences are unsigned so their 20-digit zero-padded decimal form sorts
//! lexicographically exactly like numeric order. Ticks are a *signed* 64-bit
//! quantity (spec §3.1); to keep lexicographic byte order equal to numeric
//! order for negative ticks too, the tick is first mapped onto the unsigned
//! range by flipping its sign bit (a standard monotonic signed->unsigned
//! remap) before zero-padding.

use tp_core::ids::{CanonicalTick, StreamIdentity};

const SEQ_WIDTH: usize = 20;
const TICK_WIDTH: usize = 20;

pub fn event_stream_prefix(stream: &StreamIdentity) -> Vec<u8> {
    let mut out = stream.canonical().into_bytes();
    out.extend_from_slice(b":E:");
    out
}

pub fn snapshot_stream_prefix(stream: &StreamIdentity) -> Vec<u8> {
    let mut out = stream.canonical().into_bytes();
    out.extend_from_slice(b":SNAP:");
    out
}

pub fn event_key(stream: &StreamIdentity, sequence: u64) -> Vec<u8> {
    let mut out = event_stream_prefix(stream);
    out.extend_from_slice(format!("{sequence:0width$}", width = SEQ_WIDTH).as_bytes());
    out
}

/// Monotonic signed->unsigned remap: `i64::MIN` maps to `0`, `i64::MAX` maps
/// to `u64::MAX`, and numeric order is preserved throughout.
fn tick_sort_key(tick: CanonicalTick) -> u64 {
    (tick.get() as u64) ^ 0x8000_0000_0000_0000
}

pub fn snapshot_key(stream: &StreamIdentity, tick: CanonicalTick) -> Vec<u8> {
    let mut out = snapshot_stream_prefix(stream);
    out.extend_from_slice(format!("{:0width$}", tick_sort_key(tick), width = TICK_WIDTH).as_bytes());
    out
}

/// Inverse of `tick_sort_key`: recover the original signed tick from a
/// snapshot key's digit suffix.
pub fn parse_tick_from_key(stream: &StreamIdentity, key: &[u8]) -> Option<CanonicalTick> {
    let prefix = snapshot_stream_prefix(stream);
    if !key.starts_with(&prefix) {
        return None;
    }
    let digits = std::str::from_utf8(&key[prefix.len()..]).ok()?;
    let sort_key: u64 = digits.parse().ok()?;
    let raw = (sort_key ^ 0x8000_0000_0000_0000) as i64;
    Some(CanonicalTick::from(raw))
}

/// Parse the `sequence` back out of an event key (used when scanning the
/// store for `get_last_sequence`).
pub fn parse_sequence_from_key(stream: &StreamIdentity, key: &[u8]) -> Option<u64> {
    let prefix = event_stream_prefix(stream);
    if !key.starts_with(&prefix) {
        return None;
    }
    let digits = std::str::from_utf8(&key[prefix.len()..]).ok()?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> StreamIdentity {
        StreamIdentity::new("science", "trunk", 2, "geo.plates", "0").unwrap()
    }

    #[test]
    fn event_keys_sort_numerically() {
        let s = stream();
        let mut keys = vec![event_key(&s, 2), event_key(&s, 0), event_key(&s, 1)];
        keys.sort();
        assert_eq!(keys, vec![event_key(&s, 0), event_key(&s, 1), event_key(&s, 2)]);
    }

    #[test]
    fn snapshot_keys_sort_numerically_including_negative_ticks() {
        let s = stream();
        let mut keys = vec![
            snapshot_key(&s, CanonicalTick::from(10)),
            snapshot_key(&s, CanonicalTick::from(-5)),
            snapshot_key(&s, CanonicalTick::from(0)),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                snapshot_key(&s, CanonicalTick::from(-5)),
                snapshot_key(&s, CanonicalTick::from(0)),
                snapshot_key(&s, CanonicalTick::from(10)),
            ]
        );
    }

    #[test]
    fn parse_sequence_round_trips() {
        let s = stream();
        let key = event_key(&s, 42);
        assert_eq!(parse_sequence_from_key(&s, &key), Some(42));
    }

    #[test]
    fn distinct_streams_never_share_a_key() {
        let a = stream();
        let b = StreamIdentity::new("science", "trunk", 2, "geo.plates", "1").unwrap();
        assert_ne!(event_key(&a, 0), event_key(&b, 0));
        assert!(!event_key(&b, 0).starts_with(&event_stream_prefix(&a)));
    }
}
