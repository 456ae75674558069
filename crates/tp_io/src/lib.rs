//! crates/tp_io/src/lib.rs
//! The ordered KV abstraction (C1), the canonical binary codec (C2), and
//! SHA-256 chain hashing (consumed by `tp_store`'s C3/C4). This crate is
//! the only place that touches bytes-on-the-wire; `tp_store` builds the
//! event/snapshot keyspace on top of it and never encodes anything itself.

#![forbid(unsafe_code)]

pub mod codec;
pub mod hasher;
pub mod kv;

pub use codec::{decode_event, decode_topology_state, encode_event, encode_event_payload_for_hash, encode_topology_state, CodecError, CodecResult};
pub use hasher::{chain_hash, sha256, sha256_hex};
pub use kv::{MemKv, OrderedKv};

pub mod prelude {
    pub use crate::codec::*;
    pub use crate::hasher::*;
    pub use crate::kv::*;
}
