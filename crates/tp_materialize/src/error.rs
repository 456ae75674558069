//! crates/tp_materialize/src/error.rs
//! `MaterializeError` (SPEC_FULL §4.12): the fold table's "error if
//! absent/unknown-ref/retired-mutation" kinds (spec §4.5) and the
//! invariant-checker's machine-readable codes (spec §4.6, §3.3 I1-I6).

use thiserror::Error;
use tp_core::ids::{BoundaryId, JunctionId, PlateId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaterializeError {
    #[error("PlateCreated: plate {0:?} already exists")]
    PlateAlreadyExists(PlateId),
    #[error("PlateRetired: plate {0:?} does not exist")]
    PlateNotFound(PlateId),
    #[error("BoundaryCreated: boundary {0:?} already exists")]
    BoundaryAlreadyExists(BoundaryId),
    #[error("BoundaryCreated: boundary {boundary:?} references unknown plate {plate:?}")]
    BoundaryUnknownPlateRef { boundary: BoundaryId, plate: PlateId },
    #[error("boundary {0:?} does not exist")]
    BoundaryNotFound(BoundaryId),
    #[error("boundary {0:?} is retired and cannot be mutated")]
    BoundaryRetiredMutation(BoundaryId),
    #[error("JunctionCreated: junction {0:?} already exists")]
    JunctionAlreadyExists(JunctionId),
    #[error("JunctionCreated: junction {junction:?} references unknown boundary {boundary:?}")]
    JunctionUnknownBoundaryRef { junction: JunctionId, boundary: BoundaryId },
    #[error("junction {0:?} does not exist")]
    JunctionNotFound(JunctionId),
    #[error("junction {0:?} is retired and cannot be mutated")]
    JunctionRetiredMutation(JunctionId),

    /// I1/I5: a non-retired boundary must reference two distinct, existing plates.
    #[error("BoundarySeparatesTwoPlates: boundary {boundary:?} violates plate-reference invariant")]
    BoundarySeparatesTwoPlates { boundary: BoundaryId },
    /// I2: a non-retired junction must reference only existing boundaries.
    #[error("JunctionBoundaryRefInvalid: junction {junction:?} references missing boundary {boundary:?}")]
    JunctionBoundaryRefInvalid { junction: JunctionId, boundary: BoundaryId },
    /// I3 / FR-016: a retired boundary referenced by a non-retired junction.
    #[error("FR-016-RetiredBoundaryReferenced: boundary {boundary:?} retired but referenced by active junction {junction:?}")]
    Fr016RetiredBoundaryReferenced { boundary: BoundaryId, junction: JunctionId },
}

pub type MaterializeResult<T> = Result<T, MaterializeError>;
