//! crates/tp_algo/src/lib.rs
//! Reconstruction solver (C9), motion integrator (C10), and frame service
//! (C11). Pure computation over `tp_core`'s view traits — no I/O, no
//! knowledge of the event log or snapshot store.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod error;
pub mod frame;
pub mod integrator;
pub mod solver;

pub use error::{FrameError, FrameResult, IntegrateError, IntegrateResult, SolveError, SolveResult, Validity};
pub use frame::{
    canonicalize, get_mantle_frame_transform, net_rotation, transform_between, validate_definition,
    validate_temporal_consistency, Frame, FrameChainLink, FrameDefinition,
};
pub use integrator::{
    integrate_flowline, integrate_flowline_bundle, integrate_motion_path, sample_points_along_polyline,
    Direction, FlowlineBundle, FlowlineBundleSpec, FlowlineSeed, IntegrationMethod, IntegrationSpec,
    MotionPath, MotionSample, Side, StepPolicy,
};
pub use solver::{
    cache_key, reconstruct_boundaries, reconstruct_with_provenance, Feature, KinematicsProvenance,
    PlateAssignment, QueryMetadata, ReconstructedBoundary, ReconstructedFeature, ReconstructionMetadata,
    ReconstructionPolicy, ReconstructionProvenance, ReconstructionResult, StreamProvenance,
};

pub mod prelude {
    pub use crate::error::*;
    pub use crate::frame::*;
    pub use crate::integrator::*;
    pub use crate::solver::*;
}
