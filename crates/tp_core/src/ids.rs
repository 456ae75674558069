//! crates/tp_core/src/ids.rs
//! `StreamIdentity`, `CanonicalTick`, and the UUIDv7-shaped nominal ID types
//! (`PlateId`, `BoundaryId`, `JunctionId`, `EventId`, `FeatureId`).
//! Deterministic, ASCII-only, strict shapes; no I/O.

#![allow(clippy::result_large_err)]

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "std")]
use std::string::{String, ToString};
#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
use alloc::string::{String, ToString};
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::rng::IdRng;

/// Fully-qualified event-log namespace: `(variant, branch, level, domain, model)`.
///
/// All fields are non-empty; `domain` parses as `seg ("." seg)*` where
/// `seg = [A-Za-z0-9_]+`. The canonical string form is
/// `S:{variant}:{branch}:L{level}:{domain}:M{model}` and doubles as the
/// "stream hash" used in reconstruction provenance (§4.9) — it is a
/// *string*, not a content hash, because the identity already carries the
/// level/model fields that distinguish stream replacements.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StreamIdentity {
    variant: String,
    branch: String,
    level: u32,
    domain: String,
    model: String,
}

fn is_domain_segment(seg: &str) -> bool {
    !seg.is_empty()
        && seg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    domain.split('.').all(is_domain_segment)
}

impl StreamIdentity {
    pub fn new(
        variant: impl Into<String>,
        branch: impl Into<String>,
        level: u32,
        domain: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let variant = variant.into();
        let branch = branch.into();
        let domain = domain.into();
        let model = model.into();

        if variant.is_empty() {
            return Err(CoreError::InvalidStreamIdentity("variant is empty"));
        }
        if branch.is_empty() {
            return Err(CoreError::InvalidStreamIdentity("branch is empty"));
        }
        if model.is_empty() {
            return Err(CoreError::InvalidStreamIdentity("model is empty"));
        }
        if !is_valid_domain(&domain) {
            return Err(CoreError::InvalidStreamIdentity(
                "domain must be dot-separated [A-Za-z0-9_]+ segments",
            ));
        }

        Ok(Self {
            variant,
            branch,
            level,
            domain,
            model,
        })
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }
    pub fn branch(&self) -> &str {
        &self.branch
    }
    pub fn level(&self) -> u32 {
        self.level
    }
    pub fn domain(&self) -> &str {
        &self.domain
    }
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Canonical string form: `S:{variant}:{branch}:L{level}:{domain}:M{model}`.
    ///
    /// This is also the key prefix used by the event store and snapshot
    /// store (§6.5); all bytes are ASCII so lexicographic key order matches
    /// the prefix's string order.
    pub fn canonical(&self) -> String {
        let mut s = String::with_capacity(
            1 + 1 + self.variant.len()
                + 1
                + self.branch.len()
                + 2
                + 10
                + 1
                + self.domain.len()
                + 2
                + self.model.len(),
        );
        s.push_str("S:");
        s.push_str(&self.variant);
        s.push(':');
        s.push_str(&self.branch);
        s.push_str(":L");
        s.push_str(&self.level.to_string());
        s.push(':');
        s.push_str(&self.domain);
        s.push_str(":M");
        s.push_str(&self.model);
        s
    }
}

impl fmt::Display for StreamIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Simulated-time coordinate. Total order is numeric; genesis is `0`.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CanonicalTick(pub i64);

impl CanonicalTick {
    pub const GENESIS: CanonicalTick = CanonicalTick(0);

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CanonicalTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CanonicalTick {
    fn from(v: i64) -> Self {
        CanonicalTick(v)
    }
}

/// Compose the 16-byte body of a UUIDv7-shaped identifier.
///
/// `time_prefix_ms` fills bytes `0..6` (big-endian 48-bit milliseconds) when
/// present, or zero when absent (the scenario-reproducible path: wall-clock
/// sourcing is the caller's concern, never this crate's — see Non-goals).
/// The remaining bytes are drawn from `rng` and then masked to carry the
/// UUID version nibble (byte 6, high nibble = `0x7`) and RFC-4122 variant
/// bits (byte 8, top two bits = `0b10`), matching the standard UUIDv7 byte
/// layout.
pub(crate) fn generate_uuid7_bytes(time_prefix_ms: Option<u64>, rng: &mut IdRng) -> [u8; 16] {
    let mut buf = [0u8; 16];

    let ms = time_prefix_ms.unwrap_or(0);
    let ms_bytes = ms.to_be_bytes(); // 8 bytes, we want the low 6
    buf[0..6].copy_from_slice(&ms_bytes[2..8]);

    // Bytes 6..16 (10 bytes) are random, then versions/variant bits are
    // stamped over the top nibble/bits of bytes 6 and 8 respectively.
    rng.fill_bytes(&mut buf[6..16]);
    buf[6] = 0x70 | (buf[6] & 0x0F);
    buf[8] = 0x80 | (buf[8] & 0x3F);

    buf
}

fn hex_nibble(b: u8) -> u8 {
    match b {
        0..=9 => b'0' + b,
        10..=15 => b'a' + (b - 10),
        _ => unreachable!(),
    }
}

fn format_hyphenated(bytes: &[u8; 16]) -> String {
    let mut out = String::with_capacity(36);
    for (i, b) in bytes.iter().enumerate() {
        if matches!(i, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        out.push(hex_nibble(b >> 4) as char);
        out.push(hex_nibble(b & 0x0F) as char);
    }
    out
}

fn parse_hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn parse_hyphenated(s: &str) -> Option<[u8; 16]> {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return None;
    }
    for (i, &b) in bytes.iter().enumerate() {
        let expect_dash = matches!(i, 8 | 13 | 18 | 23);
        if expect_dash {
            if b != b'-' {
                return None;
            }
        } else if parse_hex_nibble(b).is_none() {
            return None;
        }
    }
    let mut out = [0u8; 16];
    let mut out_i = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'-' {
            i += 1;
            continue;
        }
        let hi = parse_hex_nibble(bytes[i])?;
        let lo = parse_hex_nibble(bytes[i + 1])?;
        out[out_i] = (hi << 4) | lo;
        out_i += 1;
        i += 2;
    }
    Some(out)
}

/// Generates one UUIDv7-shaped newtype over `[u8; 16]` per identifier kind.
/// Distinct types share no cross-type equality even though the underlying
/// bits have the same shape. `Ord`/`PartialOrd` are derived over the raw
/// bytes, giving "ascending ID byte order" (§4.9) for free via `.sort()`.
macro_rules! uuid7_newtype {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub [u8; 16]);

        impl $name {
            /// Non-deterministic in the sense that it depends on caller-supplied
            /// randomness and an optional time prefix; deterministic given the
            /// same `(rng-state, time_prefix_ms)`.
            pub fn generate(rng: &mut IdRng, time_prefix_ms: Option<u64>) -> Self {
                $name(generate_uuid7_bytes(time_prefix_ms, rng))
            }

            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                $name(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&format_hyphenated(&self.0))
            }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_hyphenated(s)
                    .map($name)
                    .ok_or(CoreError::InvalidId(concat!(
                        "expected 36-char hyphenated hex for ",
                        stringify!($name)
                    )))
            }
        }

        impl TryFrom<&str> for $name {
            type Error = CoreError;
            fn try_from(s: &str) -> Result<Self, Self::Error> {
                s.parse()
            }
        }
    };
}

uuid7_newtype!(PlateId, "Identifier for a tectonic plate.");
uuid7_newtype!(BoundaryId, "Identifier for a boundary between two plates.");
uuid7_newtype!(JunctionId, "Identifier for a junction at a boundary meeting point.");
uuid7_newtype!(EventId, "Identifier for a single event envelope.");
uuid7_newtype!(FeatureId, "Identifier for a reconstructable feature.");
