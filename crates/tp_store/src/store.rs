//! crates/tp_store/src/store.rs
//! The hash-chained, tick-stamped append-only event store (C3, spec §4.3).
//!
//! The store is the sole chain authority: any caller-supplied `hash`/
//! `previous_hash` on an appended event is ignored and recomputed. Append
//! is all-or-nothing for a batch (spec §4.3 point 3); since every event key
//! is written via a single atomic `OrderedKv::put` and `get_last_sequence`
//! is derived by scanning for the highest *present* event key rather than a
//! separate sentinel, a torn multi-event batch is detected for what it is
//! on the next append (the next caller-assigned sequence will not match the
//! partially-written tail) or the next read (the chain stops cleanly at the
//! last fully-written event) — no extra sentinel key is required for this
//! KV shape. See DESIGN.md for the grounding of this choice.

use std::sync::Arc;

use tp_core::events::TopologyEvent;
use tp_core::ids::{CanonicalTick, StreamIdentity};
use tp_io::{decode_event, encode_event, encode_event_payload_for_hash, chain_hash, OrderedKv};

use crate::error::{StoreError, StoreResult};
use crate::keys::{event_key, event_stream_prefix, parse_sequence_from_key};
use crate::reporter::TickPolicyReporter;

/// Tick-monotonicity enforcement at append time (spec §4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Permit any tick, including regressions. Default.
    #[default]
    Allow,
    /// Permit regressions but report them through the `TickPolicyReporter`.
    Warn,
    /// Reject an append whose tick regresses relative to the stream's last
    /// applied tick.
    Reject,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AppendOptions {
    pub tick_policy: TickPolicy,
}

/// The hash-chained event store over an `OrderedKv` backend.
pub struct EventStore {
    kv: Arc<dyn OrderedKv>,
}

impl EventStore {
    pub fn new(kv: Arc<dyn OrderedKv>) -> Self {
        Self { kv }
    }

    /// The largest `sequence` present for `stream`, or `None` if the stream
    /// has no events yet.
    pub fn get_last_sequence(&self, stream: &StreamIdentity) -> Option<u64> {
        let prefix = event_stream_prefix(stream);
        let (key, _) = self.kv.seek_last_under_prefix(&prefix)?;
        parse_sequence_from_key(stream, &key)
    }

    fn get_last_event(&self, stream: &StreamIdentity) -> StoreResult<Option<TopologyEvent>> {
        let prefix = event_stream_prefix(stream);
        match self.kv.seek_last_under_prefix(&prefix) {
            None => Ok(None),
            Some((key, value)) => {
                let sequence = parse_sequence_from_key(stream, &key).unwrap_or(0);
                let event = decode_event(&value)
                    .map_err(|source| StoreError::DecodeCorruption { sequence, source })?;
                Ok(Some(event))
            }
        }
    }

    /// Append a batch of caller-assigned events to `stream` (spec §4.3).
    /// Every event's `sequence` must be contiguous starting at
    /// `last_sequence + 1`; `previous_hash`/`hash` on the input are ignored
    /// and recomputed by the store. Returns the stamped copies actually
    /// persisted.
    pub fn append(
        &self,
        stream: &StreamIdentity,
        events: &[TopologyEvent],
        options: AppendOptions,
        reporter: &dyn TickPolicyReporter,
    ) -> StoreResult<Vec<TopologyEvent>> {
        if events.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        tracing::debug!(
            stream = %stream.canonical(),
            count = events.len(),
            "append batch starting"
        );

        let last_event = self.get_last_event(stream)?;
        let mut last_sequence = last_event.as_ref().map(|e| e.sequence);
        let mut prev_hash = last_event.as_ref().map(|e| e.hash.clone()).unwrap_or_default();
        let mut last_tick = last_event.as_ref().map(|e| e.tick);

        let mut stamped = Vec::with_capacity(events.len());

        for input in events {
            let expected = last_sequence.map(|s| s + 1).unwrap_or(0);
            if input.sequence != expected {
                return Err(StoreError::SequenceGapOrDuplicate {
                    expected,
                    got: input.sequence,
                });
            }

            if let Some(lt) = last_tick {
                match options.tick_policy {
                    TickPolicy::Allow => {}
                    TickPolicy::Warn => {
                        if input.tick < lt {
                            reporter.warn_tick_regression(&stream.canonical(), lt, input.tick);
                        }
                    }
                    TickPolicy::Reject => {
                        if input.tick < lt {
                            return Err(StoreError::TickRejected {
                                last_tick: lt.get(),
                                new_tick: input.tick.get(),
                            });
                        }
                    }
                }
            }

            let mut event = input.clone();
            event.previous_hash = prev_hash.clone();
            let payload = encode_event_payload_for_hash(&event);
            let hash = chain_hash(event.tick, stream, &prev_hash, &payload);
            event.hash = hash.clone();

            self.kv.put(&event_key(stream, event.sequence), &encode_event(&event));

            prev_hash = hash;
            last_tick = Some(event.tick);
            last_sequence = Some(event.sequence);
            stamped.push(event);
        }

        tracing::debug!(
            stream = %stream.canonical(),
            last_sequence = last_sequence.unwrap_or(0),
            "append batch complete"
        );

        Ok(stamped)
    }

    /// Decode and verify every event under `stream` from the start,
    /// yielding those with `sequence >= from_sequence_inclusive` in
    /// ascending order. Re-verifies the whole chain (not just the returned
    /// window) so a hash break earlier in the stream is never silently
    /// skipped by a later partial read.
    pub fn read(
        &self,
        stream: &StreamIdentity,
        from_sequence_inclusive: u64,
    ) -> StoreResult<Vec<TopologyEvent>> {
        let prefix = event_stream_prefix(stream);
        let raw = self.kv.seek_prefix(&prefix);

        let mut out = Vec::new();
        let mut prev_hash: Vec<u8> = Vec::new();

        for (key, value) in raw {
            let sequence = parse_sequence_from_key(stream, &key).unwrap_or(0);
            let event = decode_event(&value)
                .map_err(|source| StoreError::DecodeCorruption { sequence, source })?;

            if event.previous_hash != prev_hash {
                return Err(StoreError::PreviousHashBreak { sequence });
            }
            let payload = encode_event_payload_for_hash(&event);
            let recomputed = chain_hash(event.tick, stream, &prev_hash, &payload);
            if recomputed != event.hash {
                return Err(StoreError::HashMismatch { sequence });
            }
            prev_hash = event.hash.clone();

            if sequence >= from_sequence_inclusive {
                out.push(event);
            }
        }

        Ok(out)
    }
}

/// Standalone chain-integrity check over an already-decoded event slice
/// (spec §8 "Chain integrity"), independent of any store instance: `true`
/// iff genesis has an empty `previous_hash`, every subsequent
/// `previous_hash` equals its predecessor's `hash`, and every `hash`
/// matches the recomputation from `(tick, stream_canonical, previous_hash,
/// payload)`.
pub fn validate_chain(stream: &StreamIdentity, events: &[TopologyEvent]) -> bool {
    let mut prev_hash: Vec<u8> = Vec::new();
    for event in events {
        if event.previous_hash != prev_hash {
            return false;
        }
        let payload = encode_event_payload_for_hash(event);
        let recomputed = chain_hash(event.tick, stream, &prev_hash, &payload);
        if recomputed != event.hash {
            return false;
        }
        prev_hash = event.hash.clone();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::events::EventKind;
    use tp_core::ids::{EventId, PlateId};
    use tp_core::rng::IdRng;
    use tp_io::MemKv;

    fn stream(model: &str) -> StreamIdentity {
        StreamIdentity::new("science", "trunk", 2, "geo.plates", model).unwrap()
    }

    fn plate_created(rng: &mut IdRng, tick: i64, sequence: u64, stream: &StreamIdentity) -> TopologyEvent {
        TopologyEvent::new_unstamped(
            EventId::generate(rng, None),
            EventKind::PlateCreated {
                plate_id: PlateId::generate(rng, None),
            },
            CanonicalTick::from(tick),
            sequence,
            stream.clone(),
        )
    }

    #[test]
    fn append_then_read_round_trips_and_chains() {
        let kv = Arc::new(MemKv::new());
        let store = EventStore::new(kv);
        let s = stream("0");
        let mut rng = IdRng::from_seed_u64(1);

        let events = vec![
            plate_created(&mut rng, 10, 0, &s),
            plate_created(&mut rng, 20, 1, &s),
        ];
        let stamped = store
            .append(&s, &events, AppendOptions::default(), &crate::reporter::TracingReporter)
            .unwrap();
        assert_eq!(stamped[0].previous_hash, Vec::<u8>::new());
        assert_eq!(stamped[1].previous_hash, stamped[0].hash);

        let read_back = store.read(&s, 0).unwrap();
        assert_eq!(read_back, stamped);
        assert!(validate_chain(&s, &read_back));
        assert_eq!(store.get_last_sequence(&s), Some(1));
    }

    #[test]
    fn sequence_gap_is_rejected() {
        let kv = Arc::new(MemKv::new());
        let store = EventStore::new(kv);
        let s = stream("0");
        let mut rng = IdRng::from_seed_u64(2);
        let bad = vec![plate_created(&mut rng, 0, 5, &s)];
        let err = store
            .append(&s, &bad, AppendOptions::default(), &crate::reporter::TracingReporter)
            .unwrap_err();
        assert_eq!(err, StoreError::SequenceGapOrDuplicate { expected: 0, got: 5 });
    }

    #[test]
    fn tick_reject_policy_fails_on_regression() {
        let kv = Arc::new(MemKv::new());
        let store = EventStore::new(kv);
        let s = stream("0");
        let mut rng = IdRng::from_seed_u64(3);
        let first = vec![plate_created(&mut rng, 100, 0, &s)];
        store
            .append(&s, &first, AppendOptions::default(), &crate::reporter::TracingReporter)
            .unwrap();

        let regressed = vec![plate_created(&mut rng, 50, 1, &s)];
        let opts = AppendOptions {
            tick_policy: TickPolicy::Reject,
        };
        let err = store
            .append(&s, &regressed, opts, &crate::reporter::TracingReporter)
            .unwrap_err();
        assert_eq!(err, StoreError::TickRejected { last_tick: 100, new_tick: 50 });
    }

    #[test]
    fn tick_warn_policy_reports_but_succeeds() {
        let kv = Arc::new(MemKv::new());
        let store = EventStore::new(kv);
        let s = stream("0");
        let mut rng = IdRng::from_seed_u64(4);
        let first = vec![plate_created(&mut rng, 100, 0, &s)];
        store
            .append(&s, &first, AppendOptions::default(), &crate::reporter::TracingReporter)
            .unwrap();

        let regressed = vec![plate_created(&mut rng, 50, 1, &s)];
        let opts = AppendOptions {
            tick_policy: TickPolicy::Warn,
        };
        let reporter = crate::reporter::CapturingReporter::default();
        store.append(&s, &regressed, opts, &reporter).unwrap();
        assert_eq!(reporter.warnings.lock().unwrap().len(), 1);
    }

    #[test]
    fn corruption_is_detected_on_byte_flip() {
        let kv = Arc::new(MemKv::new());
        let store = EventStore::new(Arc::clone(&kv));
        let s = stream("0");
        let mut rng = IdRng::from_seed_u64(5);
        let events = vec![plate_created(&mut rng, 10, 0, &s)];
        store
            .append(&s, &events, AppendOptions::default(), &crate::reporter::TracingReporter)
            .unwrap();

        // Flip a byte in the persisted value directly through the KV.
        let key = event_key(&s, 0);
        let mut value = kv.try_get(&key).unwrap();
        let last = value.len() - 1;
        value[last] ^= 0xFF;
        kv.put(&key, &value);

        let err = store.read(&s, 0).unwrap_err();
        assert!(matches!(
            err,
            StoreError::HashMismatch { sequence: 0 } | StoreError::DecodeCorruption { sequence: 0, .. }
        ));
    }

    #[test]
    fn streams_are_isolated_even_with_colliding_sequences() {
        let kv = Arc::new(MemKv::new());
        let store = EventStore::new(kv);
        let s1 = stream("0");
        let s2 = stream("1");
        let mut rng = IdRng::from_seed_u64(6);

        store
            .append(&s1, &[plate_created(&mut rng, 1, 0, &s1)], AppendOptions::default(), &crate::reporter::TracingReporter)
            .unwrap();
        store
            .append(&s2, &[plate_created(&mut rng, 1, 0, &s2)], AppendOptions::default(), &crate::reporter::TracingReporter)
            .unwrap();

        let r1 = store.read(&s1, 0).unwrap();
        let r2 = store.read(&s2, 0).unwrap();
        assert_eq!(r1.len(), 1);
        assert_eq!(r2.len(), 1);
        assert_ne!(r1[0].event_id, r2[0].event_id);
    }
}
