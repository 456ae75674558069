//! crates/tp_core/src/events.rs
//! The closed event-kind set and the common event envelope (§3.2).

#[cfg(feature = "std")]
use std::string::String;

#[cfg(not(feature = "std"))]
use alloc::string::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::{Geometry, Point2};
use crate::ids::{BoundaryId, CanonicalTick, EventId, JunctionId, PlateId, StreamIdentity};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoundaryType {
    Divergent,
    Convergent,
    Transform,
}

/// The closed set of topology events. Variant order here fixes the
/// canonical codec's `variant_index` table (§4.2) — never reorder.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventKind {
    PlateCreated {
        plate_id: PlateId,
    },
    PlateRetired {
        plate_id: PlateId,
        reason: Option<String>,
    },
    BoundaryCreated {
        boundary_id: BoundaryId,
        plate_id_left: PlateId,
        plate_id_right: PlateId,
        boundary_type: BoundaryType,
        geometry: Geometry,
    },
    BoundaryTypeChanged {
        boundary_id: BoundaryId,
        old_type: BoundaryType,
        new_type: BoundaryType,
    },
    BoundaryGeometryUpdated {
        boundary_id: BoundaryId,
        new_geometry: Geometry,
    },
    BoundaryRetired {
        boundary_id: BoundaryId,
        reason: Option<String>,
    },
    JunctionCreated {
        junction_id: JunctionId,
        boundary_ids: Vec<BoundaryId>,
        location: Point2,
    },
    JunctionUpdated {
        junction_id: JunctionId,
        new_boundary_ids: Vec<BoundaryId>,
        new_location: Option<Point2>,
    },
    JunctionRetired {
        junction_id: JunctionId,
        reason: Option<String>,
    },
}

#[cfg(feature = "std")]
use std::vec::Vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

impl EventKind {
    /// Stable variant index consumed by the canonical codec's sum-type
    /// encoding. Indices are part of the wire format; never renumber.
    pub fn variant_index(&self) -> u8 {
        match self {
            EventKind::PlateCreated { .. } => 0,
            EventKind::PlateRetired { .. } => 1,
            EventKind::BoundaryCreated { .. } => 2,
            EventKind::BoundaryTypeChanged { .. } => 3,
            EventKind::BoundaryGeometryUpdated { .. } => 4,
            EventKind::BoundaryRetired { .. } => 5,
            EventKind::JunctionCreated { .. } => 6,
            EventKind::JunctionUpdated { .. } => 7,
            EventKind::JunctionRetired { .. } => 8,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            EventKind::PlateCreated { .. } => "PlateCreated",
            EventKind::PlateRetired { .. } => "PlateRetired",
            EventKind::BoundaryCreated { .. } => "BoundaryCreated",
            EventKind::BoundaryTypeChanged { .. } => "BoundaryTypeChanged",
            EventKind::BoundaryGeometryUpdated { .. } => "BoundaryGeometryUpdated",
            EventKind::BoundaryRetired { .. } => "BoundaryRetired",
            EventKind::JunctionCreated { .. } => "JunctionCreated",
            EventKind::JunctionUpdated { .. } => "JunctionUpdated",
            EventKind::JunctionRetired { .. } => "JunctionRetired",
        }
    }
}

/// A stamped event as it is persisted and replayed: the payload (`kind`)
/// plus the envelope fields the store is solely responsible for
/// (`previous_hash`, `hash`) and the caller-assigned ordering fields
/// (`tick`, `sequence`).
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TopologyEvent {
    pub event_id: EventId,
    pub kind: EventKind,
    pub tick: CanonicalTick,
    /// Monotone per stream: the first event is `0`.
    pub sequence: u64,
    pub stream_identity: StreamIdentity,
    /// Empty for genesis (`sequence == 0`).
    pub previous_hash: Vec<u8>,
    /// Computed by the store; any caller-supplied value is overwritten.
    pub hash: Vec<u8>,
}

impl TopologyEvent {
    /// Construct the fields a caller controls; `previous_hash`/`hash` are
    /// left empty for the store to stamp (§4.3 — "caller-provided hashes
    /// are ignored and overwritten").
    pub fn new_unstamped(
        event_id: EventId,
        kind: EventKind,
        tick: CanonicalTick,
        sequence: u64,
        stream_identity: StreamIdentity,
    ) -> Self {
        Self {
            event_id,
            kind,
            tick,
            sequence,
            stream_identity,
            previous_hash: Vec::new(),
            hash: Vec::new(),
        }
    }
}
