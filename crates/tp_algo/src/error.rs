//! crates/tp_algo/src/error.rs
//! Validation-only error taxonomies for the solver, integrator, and frame
//! service (spec §4.9-§4.11, §7): none of these three fail on absent
//! kinematics (identity/zero-velocity substitution is the documented
//! fallback), only on malformed inputs.

use thiserror::Error;
use tp_core::ids::BoundaryId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("reconstruction target tick references an unknown boundary {0:?}")]
    UnknownBoundaryRef(BoundaryId),
}

pub type SolveResult<T> = Result<T, SolveError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrateError {
    #[error("non-positive step_ticks: {0}")]
    NonPositiveStepTicks(i64),
    #[error("non-positive max_steps: {0}")]
    NonPositiveMaxSteps(u32),
    #[error("non-positive sample_spacing: {0}")]
    NonPositiveSampleSpacing(f64),
}

pub type IntegrateResult<T> = Result<T, IntegrateError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("ChainEmpty: frame definition has no links")]
    ChainEmpty,
    #[error("TemporalOverlap: two links sharing base frame have overlapping validity ranges")]
    TemporalOverlap,
}

pub type FrameResult<T> = Result<T, FrameError>;

/// Whether a `transform_between` result is fully determined, partially
/// determined (part of the chain had no kinematics entry), or wholly
/// absent; surfaced instead of raising `MissingKinematics` as an exception
/// (spec §4.11 "Failure taxonomy... surfaces in validity = PartialOrAbsent,
/// not an exception").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validity {
    Full,
    PartialOrAbsent,
}
