//! crates/tp_store/src/error.rs
//! The `StoreError` taxonomy (spec §7: Policy and Corruption kinds that
//! belong to the event/snapshot store).

use thiserror::Error;
use tp_io::CodecError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("sequence gap or duplicate: expected {expected}, got {got}")]
    SequenceGapOrDuplicate { expected: u64, got: u64 },

    #[error("tick policy rejected append: last_tick={last_tick}, new_tick={new_tick}")]
    TickRejected { last_tick: i64, new_tick: i64 },

    #[error("decode corruption at sequence {sequence}: {source}")]
    DecodeCorruption { sequence: u64, source: CodecError },

    #[error("hash mismatch at sequence {sequence}: stored chain hash does not match recomputation")]
    HashMismatch { sequence: u64 },

    #[error("previous-hash chain break at sequence {sequence}: does not equal predecessor's hash")]
    PreviousHashBreak { sequence: u64 },

    #[error("empty event batch")]
    EmptyBatch,
}

pub type StoreResult<T> = Result<T, StoreError>;
