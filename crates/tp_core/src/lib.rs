//! tp_core — identifiers, event/geometry data model, rotation math, and
//! deterministic RNG for the tectonic event engine.
//!
//! This crate is **I/O-free**. It defines the stable types and pure
//! functions shared across the engine (`tp_io`, `tp_store`,
//! `tp_materialize`, `tp_algo`, `tp_pipeline`).
//!
//! Serialization derives are gated behind the `serde` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod determinism;
pub mod events;
pub mod geometry;
pub mod ids;
pub mod rng;
pub mod rotation;
pub mod seed;
pub mod state;
pub mod views;

pub mod errors {
    use core::fmt;

    /// Validation-kind errors raised by pure construction/parsing in `tp_core`.
    ///
    /// Nothing in this crate touches storage, so there is no "Corruption" or
    /// "Policy" variant here — those live in `tp_store` and `tp_materialize`.
    /// Hand-implemented `Display`/`Error` rather than `thiserror::Error`
    /// because this crate stays `no_std`-buildable without the `std`
    /// feature, and `thiserror`'s derive unconditionally requires
    /// `std::error::Error`.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidStreamIdentity(&'static str),
        InvalidId(&'static str),
        ZeroAxis,
        NonPositiveStep { field: &'static str },
        EmptyFrameChain,
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidStreamIdentity(why) => {
                    write!(f, "invalid stream identity: {why}")
                }
                CoreError::InvalidId(why) => write!(f, "invalid id: {why}"),
                CoreError::ZeroAxis => {
                    write!(f, "zero-length axis where a directed rotation was required")
                }
                CoreError::NonPositiveStep { field } => {
                    write!(f, "non-positive step: {field}")
                }
                CoreError::EmptyFrameChain => write!(f, "empty frame definition"),
            }
        }
    }

    #[cfg(feature = "std")]
    impl std::error::Error for CoreError {}

    pub type CoreResult<T> = Result<T, CoreError>;
}

pub mod prelude {
    pub use crate::determinism::*;
    pub use crate::errors::{CoreError, CoreResult};
    pub use crate::events::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
    pub use crate::rotation::*;
    pub use crate::seed::*;
    pub use crate::state::*;
    pub use crate::views::*;
}
