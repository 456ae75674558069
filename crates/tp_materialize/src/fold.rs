//! crates/tp_materialize/src/fold.rs
//! The event fold table (spec §4.5 "Fold"): applies one `TopologyEvent` to a
//! `TopologyState`, mutating entity maps and failing on a duplicate/unknown
//! reference/retired mutation.

use tp_core::events::{EventKind, TopologyEvent};
use tp_core::state::{Boundary, Junction, Plate, TopologyState};

use crate::error::{MaterializeError, MaterializeResult};

/// Apply one already tick/sequence-selected event to `state` in place.
/// Advances `state.last_event_sequence` on success; leaves the state
/// untouched (caller discards it) on error, since fold is fail-fast (spec
/// §4.5, §7 "Propagation").
pub fn apply_event(state: &mut TopologyState, event: &TopologyEvent) -> MaterializeResult<()> {
    match &event.kind {
        EventKind::PlateCreated { plate_id } => {
            if state.plates.contains_key(plate_id) {
                return Err(MaterializeError::PlateAlreadyExists(*plate_id));
            }
            state.plates.insert(
                *plate_id,
                Plate {
                    id: *plate_id,
                    retired: false,
                    retired_reason: None,
                },
            );
        }

        EventKind::PlateRetired { plate_id, reason } => {
            let plate = state
                .plates
                .get_mut(plate_id)
                .ok_or(MaterializeError::PlateNotFound(*plate_id))?;
            plate.retired = true;
            plate.retired_reason = reason.clone();
        }

        EventKind::BoundaryCreated {
            boundary_id,
            plate_id_left,
            plate_id_right,
            boundary_type,
            geometry,
        } => {
            if state.boundaries.contains_key(boundary_id) {
                return Err(MaterializeError::BoundaryAlreadyExists(*boundary_id));
            }
            if !state.plates.contains_key(plate_id_left) {
                return Err(MaterializeError::BoundaryUnknownPlateRef {
                    boundary: *boundary_id,
                    plate: *plate_id_left,
                });
            }
            if !state.plates.contains_key(plate_id_right) {
                return Err(MaterializeError::BoundaryUnknownPlateRef {
                    boundary: *boundary_id,
                    plate: *plate_id_right,
                });
            }
            state.boundaries.insert(
                *boundary_id,
                Boundary {
                    id: *boundary_id,
                    plate_left: *plate_id_left,
                    plate_right: *plate_id_right,
                    boundary_type: *boundary_type,
                    geometry: geometry.clone(),
                    retired: false,
                    retired_reason: None,
                },
            );
        }

        EventKind::BoundaryTypeChanged {
            boundary_id,
            new_type,
            ..
        } => {
            let boundary = state
                .boundaries
                .get_mut(boundary_id)
                .ok_or(MaterializeError::BoundaryNotFound(*boundary_id))?;
            if boundary.retired {
                return Err(MaterializeError::BoundaryRetiredMutation(*boundary_id));
            }
            boundary.boundary_type = *new_type;
        }

        EventKind::BoundaryGeometryUpdated {
            boundary_id,
            new_geometry,
        } => {
            let boundary = state
                .boundaries
                .get_mut(boundary_id)
                .ok_or(MaterializeError::BoundaryNotFound(*boundary_id))?;
            if boundary.retired {
                return Err(MaterializeError::BoundaryRetiredMutation(*boundary_id));
            }
            boundary.geometry = new_geometry.clone();
        }

        EventKind::BoundaryRetired { boundary_id, reason } => {
            let boundary = state
                .boundaries
                .get_mut(boundary_id)
                .ok_or(MaterializeError::BoundaryNotFound(*boundary_id))?;
            boundary.retired = true;
            boundary.retired_reason = reason.clone();
        }

        EventKind::JunctionCreated {
            junction_id,
            boundary_ids,
            location,
        } => {
            if state.junctions.contains_key(junction_id) {
                return Err(MaterializeError::JunctionAlreadyExists(*junction_id));
            }
            for boundary_id in boundary_ids {
                if !state.boundaries.contains_key(boundary_id) {
                    return Err(MaterializeError::JunctionUnknownBoundaryRef {
                        junction: *junction_id,
                        boundary: *boundary_id,
                    });
                }
            }
            state.junctions.insert(
                *junction_id,
                Junction {
                    id: *junction_id,
                    boundary_ids: boundary_ids.clone(),
                    location: *location,
                    retired: false,
                    retired_reason: None,
                },
            );
        }

        EventKind::JunctionUpdated {
            junction_id,
            new_boundary_ids,
            new_location,
        } => {
            let existing_boundaries_ok = new_boundary_ids
                .iter()
                .all(|b| state.boundaries.contains_key(b));
            if !existing_boundaries_ok {
                let offending = new_boundary_ids
                    .iter()
                    .find(|b| !state.boundaries.contains_key(b))
                    .copied()
                    .expect("existing_boundaries_ok is false implies a missing ref exists");
                return Err(MaterializeError::JunctionUnknownBoundaryRef {
                    junction: *junction_id,
                    boundary: offending,
                });
            }
            let junction = state
                .junctions
                .get_mut(junction_id)
                .ok_or(MaterializeError::JunctionNotFound(*junction_id))?;
            if junction.retired {
                return Err(MaterializeError::JunctionRetiredMutation(*junction_id));
            }
            junction.boundary_ids = new_boundary_ids.clone();
            if let Some(loc) = new_location {
                junction.location = *loc;
            }
        }

        EventKind::JunctionRetired { junction_id, reason } => {
            let junction = state
                .junctions
                .get_mut(junction_id)
                .ok_or(MaterializeError::JunctionNotFound(*junction_id))?;
            junction.retired = true;
            junction.retired_reason = reason.clone();
        }
    }

    state.last_event_sequence = Some(event.sequence);
    Ok(())
}

/// Apply `events` to `state` in the order given, stopping at the first
/// error (spec §7 "materialize is fail-fast on the first invariant or
/// corruption error"). Events must already be tick/sequence-selected by the
/// caller (see `cutoff`).
pub fn fold(mut state: TopologyState, events: &[TopologyEvent]) -> MaterializeResult<TopologyState> {
    for event in events {
        apply_event(&mut state, event)?;
    }
    Ok(state)
}
