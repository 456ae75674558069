//! crates/tp_core/src/views.rs
//! Small capability contracts consumed by `tp_algo`'s solver, integrator,
//! and frame service (§6.2, §6.3, §9 "Shared view interfaces"). Concrete
//! implementations may be the real `TopologyState`/event-store-backed
//! kinematics, or an in-memory fake built purely for tests.

#[cfg(feature = "std")]
use std::collections::BTreeMap;

#[cfg(not(feature = "std"))]
use alloc::collections::BTreeMap;

use crate::ids::{BoundaryId, CanonicalTick, JunctionId, PlateId, StreamIdentity};
use crate::rotation::Quaternion;
use crate::state::{Boundary, Junction, Plate};

/// Read-only snapshot of a materialized topology, as consumed by the
/// reconstruction solver and motion integrator (§6.3).
pub trait TopologyView {
    fn identity(&self) -> &StreamIdentity;
    fn last_event_sequence(&self) -> Option<u64>;
    fn plates(&self) -> &BTreeMap<PlateId, Plate>;
    fn boundaries(&self) -> &BTreeMap<BoundaryId, Boundary>;
    fn junctions(&self) -> &BTreeMap<JunctionId, Junction>;
}

/// A boundary-crossing contract to an external kinematics model: "given
/// plate `P` and tick `t`, return the rotation quaternion or signal absent"
/// (§1, §6.2). Absence is not an error — solver and integrator substitute
/// identity / zero velocity (§7 "Absent").
pub trait KinematicsView {
    fn identity(&self) -> &StreamIdentity;
    fn last_event_sequence(&self) -> Option<u64>;

    /// Returns `(rotation, present)`. When `present` is `false`, `rotation`
    /// is unspecified and callers must not use it — use
    /// `try_get_rotation_or_identity` for the documented-fallback path.
    fn try_get_rotation(&self, plate_id: PlateId, tick: CanonicalTick) -> (Quaternion, bool);

    fn try_get_rotation_or_identity(&self, plate_id: PlateId, tick: CanonicalTick) -> Quaternion {
        let (rotation, present) = self.try_get_rotation(plate_id, tick);
        if present {
            rotation
        } else {
            Quaternion::IDENTITY
        }
    }
}

/// Optional True-Polar-Wander model consumed by the frame service (§6.4).
/// When absent, the Absolute<->Mantle transform collapses to identity.
pub trait TruePolarWanderModel {
    fn get_rotation_at(&self, tick: CanonicalTick) -> Quaternion;
}

impl<T: TopologyView> TopologyView for &T {
    fn identity(&self) -> &StreamIdentity {
        (**self).identity()
    }
    fn last_event_sequence(&self) -> Option<u64> {
        (**self).last_event_sequence()
    }
    fn plates(&self) -> &BTreeMap<PlateId, Plate> {
        (**self).plates()
    }
    fn boundaries(&self) -> &BTreeMap<BoundaryId, Boundary> {
        (**self).boundaries()
    }
    fn junctions(&self) -> &BTreeMap<JunctionId, Junction> {
        (**self).junctions()
    }
}
