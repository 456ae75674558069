//! crates/tp_materialize/src/invariants.rs
//! The invariant checker (C6, spec §4.6, §3.3 I1-I6). Checked in the order
//! the spec lists, stopping at the first violation: reference validity (I1,
//! I5), junction boundary-ref validity (I2), then FR-016 (I3). I4 (id
//! uniqueness) and I6 (`last_event_sequence` correctness) hold by
//! construction of `fold` over `BTreeMap` entity maps and are asserted by
//! tests rather than re-walked here.

use tp_core::state::TopologyState;

use crate::error::{MaterializeError, MaterializeResult};

/// Run the full invariant checker over a folded state. Iteration is over
/// `BTreeMap`s, so the check itself is deterministic; the *order of
/// violations found* is also deterministic but only the first is ever
/// surfaced (spec §4.6 "stopping at the first violation").
pub fn check_invariants(state: &TopologyState) -> MaterializeResult<()> {
    for boundary in state.boundaries.values() {
        if boundary.retired {
            continue;
        }
        let left_ok = state.plates.contains_key(&boundary.plate_left);
        let right_ok = state.plates.contains_key(&boundary.plate_right);
        let distinct = boundary.plate_left != boundary.plate_right;
        if !left_ok || !right_ok || !distinct {
            return Err(MaterializeError::BoundarySeparatesTwoPlates { boundary: boundary.id });
        }
    }

    for junction in state.junctions.values() {
        if junction.retired {
            continue;
        }
        for boundary_id in &junction.boundary_ids {
            if !state.boundaries.contains_key(boundary_id) {
                return Err(MaterializeError::JunctionBoundaryRefInvalid {
                    junction: junction.id,
                    boundary: *boundary_id,
                });
            }
        }
    }

    for boundary in state.boundaries.values() {
        if !boundary.retired {
            continue;
        }
        for junction in state.junctions.values() {
            if junction.retired {
                continue;
            }
            if junction.boundary_ids.contains(&boundary.id) {
                return Err(MaterializeError::Fr016RetiredBoundaryReferenced {
                    boundary: boundary.id,
                    junction: junction.id,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::events::{BoundaryType, EventKind, TopologyEvent};
    use tp_core::geometry::{Geometry, Point2};
    use tp_core::ids::{CanonicalTick, EventId, PlateId, StreamIdentity};
    use tp_core::rng::IdRng;

    use crate::fold::fold;

    fn stream() -> StreamIdentity {
        StreamIdentity::new("science", "trunk", 2, "geo.plates", "0").unwrap()
    }

    #[test]
    fn clean_state_passes() {
        let mut rng = IdRng::from_seed_u64(1);
        let p1 = PlateId::generate(&mut rng, None);
        let p2 = PlateId::generate(&mut rng, None);
        let b1 = tp_core::ids::BoundaryId::generate(&mut rng, None);
        let events = vec![
            TopologyEvent::new_unstamped(
                EventId::generate(&mut rng, None),
                EventKind::PlateCreated { plate_id: p1 },
                CanonicalTick::from(0),
                0,
                stream(),
            ),
            TopologyEvent::new_unstamped(
                EventId::generate(&mut rng, None),
                EventKind::PlateCreated { plate_id: p2 },
                CanonicalTick::from(1),
                1,
                stream(),
            ),
            TopologyEvent::new_unstamped(
                EventId::generate(&mut rng, None),
                EventKind::BoundaryCreated {
                    boundary_id: b1,
                    plate_id_left: p1,
                    plate_id_right: p2,
                    boundary_type: BoundaryType::Divergent,
                    geometry: Geometry::Point2(Point2 { x: 0.0, y: 0.0 }),
                },
                CanonicalTick::from(2),
                2,
                stream(),
            ),
        ];
        let state = fold(TopologyState::empty(stream()), &events).unwrap();
        assert!(check_invariants(&state).is_ok());
    }

    #[test]
    fn fr016_retired_boundary_referenced_by_active_junction_fails() {
        let mut rng = IdRng::from_seed_u64(2);
        let p1 = PlateId::generate(&mut rng, None);
        let p2 = PlateId::generate(&mut rng, None);
        let b1 = tp_core::ids::BoundaryId::generate(&mut rng, None);
        let j1 = tp_core::ids::JunctionId::generate(&mut rng, None);

        let events = vec![
            TopologyEvent::new_unstamped(
                EventId::generate(&mut rng, None),
                EventKind::PlateCreated { plate_id: p1 },
                CanonicalTick::from(0),
                0,
                stream(),
            ),
            TopologyEvent::new_unstamped(
                EventId::generate(&mut rng, None),
                EventKind::PlateCreated { plate_id: p2 },
                CanonicalTick::from(1),
                1,
                stream(),
            ),
            TopologyEvent::new_unstamped(
                EventId::generate(&mut rng, None),
                EventKind::BoundaryCreated {
                    boundary_id: b1,
                    plate_id_left: p1,
                    plate_id_right: p2,
                    boundary_type: BoundaryType::Convergent,
                    geometry: Geometry::Point2(Point2 { x: 0.0, y: 0.0 }),
                },
                CanonicalTick::from(2),
                2,
                stream(),
            ),
            TopologyEvent::new_unstamped(
                EventId::generate(&mut rng, None),
                EventKind::JunctionCreated {
                    junction_id: j1,
                    boundary_ids: vec![b1],
                    location: Point2 { x: 1.0, y: 1.0 },
                },
                CanonicalTick::from(3),
                3,
                stream(),
            ),
            TopologyEvent::new_unstamped(
                EventId::generate(&mut rng, None),
                EventKind::BoundaryRetired {
                    boundary_id: b1,
                    reason: None,
                },
                CanonicalTick::from(4),
                4,
                stream(),
            ),
        ];
        let state = fold(TopologyState::empty(stream()), &events).unwrap();
        let err = check_invariants(&state).unwrap_err();
        assert_eq!(
            err,
            MaterializeError::Fr016RetiredBoundaryReferenced {
                boundary: b1,
                junction: j1,
            }
        );
    }
}
