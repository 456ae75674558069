//! crates/tp_materialize/src/materializer.rs
//! The three materializer entry points named in spec §4.5, over an
//! in-memory event slice and an optional seed state — the pure core that
//! `tp_pipeline` wires to a live event/snapshot store. Each entry point
//! folds then runs the invariant checker (C6); any failure is returned
//! before the caller ever sees a partially-built state.

use tp_core::ids::CanonicalTick;
use tp_core::state::TopologyState;

use tp_core::events::TopologyEvent;

use crate::cutoff::{select_events_for_sequence, select_events_for_tick, StreamCapability, TickMode};
use crate::error::MaterializeResult;
use crate::fold::fold;
use crate::invariants::check_invariants;

fn fold_and_check(seed: TopologyState, events: &[TopologyEvent]) -> MaterializeResult<TopologyState> {
    let state = fold(seed, events)?;
    check_invariants(&state)?;
    Ok(state)
}

/// `materialize(stream)`: fold every event in `events` (already read in
/// ascending sequence order for the target stream) onto `seed`.
pub fn materialize(seed: TopologyState, events: &[TopologyEvent]) -> MaterializeResult<TopologyState> {
    tracing::debug!(count = events.len(), "materialize: folding full event slice");
    fold_and_check(seed, events)
}

/// `materialize_at_sequence(stream, target_seq)`.
pub fn materialize_at_sequence(
    seed: TopologyState,
    events: &[TopologyEvent],
    target_seq: u64,
) -> MaterializeResult<TopologyState> {
    let selected = select_events_for_sequence(events, target_seq);
    tracing::debug!(
        target_seq,
        selected = selected.len(),
        "materialize_at_sequence"
    );
    fold_and_check(seed, &selected)
}

/// `materialize_at_tick(stream, target_tick, mode)`.
pub fn materialize_at_tick(
    seed: TopologyState,
    events: &[TopologyEvent],
    target_tick: CanonicalTick,
    mode: TickMode,
    capability: Option<&dyn StreamCapability>,
) -> MaterializeResult<TopologyState> {
    let selected = select_events_for_tick(events, target_tick, mode, capability);
    tracing::debug!(
        target_tick = target_tick.get(),
        mode = ?mode,
        selected = selected.len(),
        "materialize_at_tick"
    );
    fold_and_check(seed, &selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::events::EventKind;
    use tp_core::ids::{EventId, PlateId, StreamIdentity};
    use tp_core::rng::IdRng;

    fn stream() -> StreamIdentity {
        StreamIdentity::new("science", "trunk", 2, "geo.plates", "0").unwrap()
    }

    fn plate_event(rng: &mut IdRng, tick: i64, sequence: u64) -> TopologyEvent {
        TopologyEvent::new_unstamped(
            EventId::generate(rng, None),
            EventKind::PlateCreated {
                plate_id: PlateId::generate(rng, None),
            },
            CanonicalTick::from(tick),
            sequence,
            stream(),
        )
    }

    /// Scenario E4: events (tick 10, seq 0), (tick 30, seq 1), (tick 20, seq 2);
    /// `materialize_at_tick(20, ScanAll)` contains seq-0 and seq-2 plates, not seq-1.
    #[test]
    fn e4_tick_non_monotone_cutoff() {
        let mut rng = IdRng::from_seed_u64(40);
        let events = vec![
            plate_event(&mut rng, 10, 0),
            plate_event(&mut rng, 30, 1),
            plate_event(&mut rng, 20, 2),
        ];
        let state = materialize_at_tick(
            TopologyState::empty(stream()),
            &events,
            CanonicalTick::from(20),
            TickMode::ScanAll,
            None,
        )
        .unwrap();
        assert_eq!(state.plates.len(), 2);
        assert_eq!(state.last_event_sequence, Some(2));
    }

    /// Scenario E7: PlateCreated x2, BoundaryCreated, JunctionCreated referencing
    /// it, BoundaryRetired (same boundary). materialize fails with the FR-016 code.
    #[test]
    fn e7_fr016_violation_fails_materialize() {
        use tp_core::events::BoundaryType;
        use tp_core::geometry::{Geometry, Point2};
        use tp_core::ids::{BoundaryId, JunctionId};

        let mut rng = IdRng::from_seed_u64(41);
        let p1 = PlateId::generate(&mut rng, None);
        let p2 = PlateId::generate(&mut rng, None);
        let b1 = BoundaryId::generate(&mut rng, None);
        let j1 = JunctionId::generate(&mut rng, None);

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
                    boundary_type: BoundaryType::Transform,
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
                    location: Point2 { x: 0.0, y: 0.0 },
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

        let start = std::time::Instant::now();
        let err = materialize(TopologyState::empty(stream()), &events).unwrap_err();
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
        assert_eq!(
            err,
            crate::error::MaterializeError::Fr016RetiredBoundaryReferenced {
                boundary: b1,
                junction: j1,
            }
        );
    }
}
