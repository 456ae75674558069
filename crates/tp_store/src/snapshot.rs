//! crates/tp_store/src/snapshot.rs
//! The persisted snapshot store (C4, spec §4.4): `TopologyState` snapshots
//! keyed by `(stream, tick)`, with an exact lookup and a "largest tick <=
//! target" lookup that respects stream boundaries absolutely.

use std::sync::Arc;

use tp_core::ids::{CanonicalTick, StreamIdentity};
use tp_core::state::TopologyState;
use tp_io::{decode_topology_state, encode_topology_state, OrderedKv};

use crate::error::{StoreError, StoreResult};
use crate::keys::{parse_tick_from_key, snapshot_key, snapshot_stream_prefix};

/// A persisted topology snapshot plus the fields needed for "resume from
/// here" replay (spec §4.4, §4.5's "Critical correctness rule": resume uses
/// `last_event_sequence`, never `tick`).
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub stream: StreamIdentity,
    pub tick: CanonicalTick,
    pub state: TopologyState,
}

pub struct SnapshotStore {
    kv: Arc<dyn OrderedKv>,
}

impl SnapshotStore {
    pub fn new(kv: Arc<dyn OrderedKv>) -> Self {
        Self { kv }
    }

    /// Overwrite any existing snapshot at `(snapshot.stream, snapshot.tick)`.
    pub fn save(&self, snapshot: &Snapshot) {
        let key = snapshot_key(&snapshot.stream, snapshot.tick);
        let bytes = encode_topology_state(&snapshot.state);
        self.kv.put(&key, &bytes);
    }

    /// Exact-match lookup at `(stream, tick)`.
    pub fn get(&self, stream: &StreamIdentity, tick: CanonicalTick) -> StoreResult<Option<Snapshot>> {
        let key = snapshot_key(stream, tick);
        match self.kv.try_get(&key) {
            None => Ok(None),
            Some(bytes) => {
                let state = decode_topology_state(&bytes)
                    .map_err(|source| StoreError::DecodeCorruption { sequence: 0, source })?;
                Ok(Some(Snapshot {
                    stream: stream.clone(),
                    tick,
                    state,
                }))
            }
        }
    }

    /// The snapshot under `stream`'s prefix with the largest `tick <=
    /// target_tick`, found via a reverse prefix scan bounded by
    /// `target_tick`'s own key (spec §4.4). Never returns a snapshot from
    /// another stream even if its tick would otherwise sort between two
    /// candidates (stream boundaries are absolute).
    pub fn get_latest_before(
        &self,
        stream: &StreamIdentity,
        target_tick: CanonicalTick,
    ) -> StoreResult<Option<Snapshot>> {
        let prefix = snapshot_stream_prefix(stream);
        let upper_inclusive_key = snapshot_key(stream, target_tick);

        // seek_last_under_prefix only bounds by prefix, not by an arbitrary
        // upper key, so scan the stream's snapshots and pick the greatest
        // key <= upper_inclusive_key. Snapshot counts per stream are small
        // relative to event counts (spec §1/§4.4), so a linear scan here is
        // the pragmatic in-memory choice; a persisted backend would use a
        // native reverse range scan bounded the same way.
        let entries = self.kv.seek_prefix(&prefix);
        let best = entries
            .into_iter()
            .filter(|(k, _)| k.as_slice() <= upper_inclusive_key.as_slice())
            .max_by(|(a, _), (b, _)| a.cmp(b));

        match best {
            None => Ok(None),
            Some((key, bytes)) => {
                let state = decode_topology_state(&bytes)
                    .map_err(|source| StoreError::DecodeCorruption { sequence: 0, source })?;
                let tick = parse_tick_from_key(stream, &key).unwrap_or(target_tick);
                Ok(Some(Snapshot {
                    stream: stream.clone(),
                    tick,
                    state,
                }))
            }
        }
    }
}
