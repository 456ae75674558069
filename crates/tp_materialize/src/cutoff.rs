//! crates/tp_materialize/src/cutoff.rs
//! Tick-cutoff policy selection (C5, spec §4.5 "the hard part"). Pure
//! functions over an already-ascending-by-sequence event slice; no store
//! access. The snapshot-accelerated "resume by sequence, not tick" rule
//! lives in `tp_pipeline`, which is the layer that actually talks to a
//! snapshot store — this module only answers "which of these events, given
//! already-read in order, apply at this tick cutoff".

use tp_core::events::TopologyEvent;
use tp_core::ids::CanonicalTick;

/// `TickMode` (spec §4.5): how `materialize_at_tick` decides which events to
/// fold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TickMode {
    /// Apply every event with `tick <= target`; never breaks early. Correct
    /// even when ticks are non-monotone in sequence order.
    #[default]
    ScanAll,
    /// Stop at the first event whose `tick > target`. Only safe when ticks
    /// are monotone in sequence order; unspecified behavior otherwise (spec
    /// §8 "Monotonicity").
    BreakOnFirstBeyondTick,
    /// Ask a capability hint; monotone -> `BreakOnFirstBeyondTick`, else
    /// `ScanAll`.
    Auto,
}

/// The capability hint consumed by `TickMode::Auto` (spec §4.5 "optional
/// stream-capability hint").
pub trait StreamCapability {
    fn is_tick_monotone_from_genesis(&self) -> bool;
}

/// A capability hint that always answers a fixed value, for tests and for
/// streams whose monotonicity is known a priori.
#[derive(Clone, Copy, Debug)]
pub struct FixedCapability(pub bool);

impl StreamCapability for FixedCapability {
    fn is_tick_monotone_from_genesis(&self) -> bool {
        self.0
    }
}

fn resolve_mode(mode: TickMode, capability: Option<&dyn StreamCapability>) -> TickMode {
    match mode {
        TickMode::Auto => {
            let monotone = capability.map(|c| c.is_tick_monotone_from_genesis()).unwrap_or(false);
            if monotone {
                TickMode::BreakOnFirstBeyondTick
            } else {
                TickMode::ScanAll
            }
        }
        other => other,
    }
}

/// Select the subset of `events` (already ascending by `sequence`) to fold
/// for `target_tick` under `mode`. Returned events are cloned in sequence
/// order so the caller can feed them straight to `fold`.
pub fn select_events_for_tick(
    events: &[TopologyEvent],
    target_tick: CanonicalTick,
    mode: TickMode,
    capability: Option<&dyn StreamCapability>,
) -> Vec<TopologyEvent> {
    match resolve_mode(mode, capability) {
        TickMode::ScanAll => events.iter().filter(|e| e.tick <= target_tick).cloned().collect(),
        TickMode::BreakOnFirstBeyondTick => {
            let mut out = Vec::with_capacity(events.len());
            for event in events {
                if event.tick > target_tick {
                    break;
                }
                out.push(event.clone());
            }
            out
        }
        TickMode::Auto => unreachable!("resolve_mode never returns Auto"),
    }
}

/// Select the subset of `events` with `sequence <= target_seq`
/// (`materialize_at_sequence`, spec §4.5). Sequence order is always
/// monotone by construction, so this never needs a tick-cutoff policy.
pub fn select_events_for_sequence(events: &[TopologyEvent], target_seq: u64) -> Vec<TopologyEvent> {
    events
        .iter()
        .filter(|e| e.sequence <= target_seq)
        .cloned()
        .collect()
}
