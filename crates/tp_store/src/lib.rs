//! crates/tp_store/src/lib.rs
//! The hash-chained event store (C3) and tick-keyed snapshot store (C4)
//! over `tp_io`'s ordered KV abstraction. Builds the persisted keyspace
//! (spec §6.5); encoding/hashing itself lives entirely in `tp_io`.

#![forbid(unsafe_code)]

pub mod error;
pub mod keys;
pub mod reporter;
pub mod snapshot;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use reporter::{CapturingReporter, TickPolicyReporter, TracingReporter};
pub use snapshot::{Snapshot, SnapshotStore};
pub use store::{validate_chain, AppendOptions, EventStore, TickPolicy};

pub mod prelude {
    pub use crate::error::*;
    pub use crate::reporter::*;
    pub use crate::snapshot::*;
    pub use crate::store::*;
}
