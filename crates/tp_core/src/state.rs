//! crates/tp_core/src/state.rs
//! `TopologyState` and its entity maps (§3.3). Defined here, rather than in
//! `tp_materialize`, so that `tp_algo`'s solver/integrator/frame service can
//! depend on the state shape without depending on the fold logic that
//! builds it — mirroring the "small capability contracts" design note
//! (§9): the state is a plain record, views are read-only borrows of it.

#[cfg(feature = "std")]
use std::collections::BTreeMap;
#[cfg(feature = "std")]
use std::string::String;
#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;
#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::events::BoundaryType;
use crate::geometry::{Geometry, Point2};
use crate::ids::{BoundaryId, JunctionId, PlateId, StreamIdentity};

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plate {
    pub id: PlateId,
    pub retired: bool,
    pub retired_reason: Option<String>,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Boundary {
    pub id: BoundaryId,
    pub plate_left: PlateId,
    pub plate_right: PlateId,
    pub boundary_type: BoundaryType,
    pub geometry: Geometry,
    pub retired: bool,
    pub retired_reason: Option<String>,
}

#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Junction {
    pub id: JunctionId,
    pub boundary_ids: Vec<BoundaryId>,
    pub location: Point2,
    pub retired: bool,
    pub retired_reason: Option<String>,
}

/// A materialized topology at some point in the event stream. Owns its
/// entity maps exclusively; views borrow from it with a lifetime that
/// cannot outlive the state (§9 "Ownership of maps in TopologyState").
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TopologyState {
    pub identity: StreamIdentity,
    pub last_event_sequence: Option<u64>,
    pub plates: BTreeMap<PlateId, Plate>,
    pub boundaries: BTreeMap<BoundaryId, Boundary>,
    pub junctions: BTreeMap<JunctionId, Junction>,
    pub violations: Vec<String>,
}

impl TopologyState {
    /// Empty state at identity, as the materializer's fold starting point
    /// when no snapshot is available.
    pub fn empty(identity: StreamIdentity) -> Self {
        Self {
            identity,
            last_event_sequence: None,
            plates: BTreeMap::new(),
            boundaries: BTreeMap::new(),
            junctions: BTreeMap::new(),
            violations: Vec::new(),
        }
    }
}

impl crate::views::TopologyView for TopologyState {
    fn identity(&self) -> &StreamIdentity {
        &self.identity
    }
    fn last_event_sequence(&self) -> Option<u64> {
        self.last_event_sequence
    }
    fn plates(&self) -> &BTreeMap<PlateId, Plate> {
        &self.plates
    }
    fn boundaries(&self) -> &BTreeMap<BoundaryId, Boundary> {
        &self.boundaries
    }
    fn junctions(&self) -> &BTreeMap<JunctionId, Junction> {
        &self.junctions
    }
}
