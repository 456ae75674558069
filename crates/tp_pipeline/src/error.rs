//! crates/tp_pipeline/src/error.rs
//! `EngineError` (A1, SPEC_FULL §4.12): the umbrella error for orchestration,
//! composed `From` each layer's own error type rather than re-stating their
//! variants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] tp_store::StoreError),
    #[error(transparent)]
    Materialize(#[from] tp_materialize::MaterializeError),
    #[error(transparent)]
    Solve(#[from] tp_algo::SolveError),
    #[error(transparent)]
    Integrate(#[from] tp_algo::IntegrateError),
    #[error(transparent)]
    Frame(#[from] tp_algo::FrameError),
}

pub type EngineResult<T> = Result<T, EngineError>;
