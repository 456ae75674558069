//! tp_materialize — pure fold of topology events into `TopologyState`
//! (C5), tick-cutoff policies, and the invariant checker (C6). No I/O:
//! operates over an in-memory event slice plus an optional seed state.

#![forbid(unsafe_code)]

pub mod cutoff;
pub mod error;
pub mod fold;
pub mod invariants;
pub mod materializer;

pub use cutoff::{select_events_for_sequence, select_events_for_tick, FixedCapability, StreamCapability, TickMode};
pub use error::{MaterializeError, MaterializeResult};
pub use fold::{apply_event, fold};
pub use invariants::check_invariants;
pub use materializer::{materialize, materialize_at_sequence, materialize_at_tick};

pub mod prelude {
    pub use crate::cutoff::*;
    pub use crate::error::*;
    pub use crate::fold::*;
    pub use crate::invariants::*;
    pub use crate::materializer::*;
}
