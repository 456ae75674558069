//! crates/tp_core/src/seed.rs
//! Scenario → per-stream seed derivation (`FNV1a-StreamIdentity-v2`, §4.7).

use crate::ids::StreamIdentity;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

#[inline]
fn fnv1a_mix_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Mix a field into the running hash with a mandatory 4-byte little-endian
/// length prefix, so that `("a", "bc")` and `("ab", "c")` never collide by
/// concatenation.
#[inline]
fn fnv1a_mix_field(hash: u64, field: &[u8]) -> u64 {
    let len = (field.len() as u32).to_le_bytes();
    let hash = fnv1a_mix_bytes(hash, &len);
    fnv1a_mix_bytes(hash, field)
}

/// `(scenario_seed, StreamIdentity) -> u64`, `FNV1a-StreamIdentity-v2`.
///
/// Mixing order is fixed: `scenario_seed` (8 little-endian bytes, no length
/// prefix — it is fixed-width), then `variant`, `branch`, `level` (as a
/// little-endian `u32`), `domain.canonical()`, `model`, each length-prefixed.
pub fn derive_seed(scenario_seed: u64, stream: &StreamIdentity) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    hash = fnv1a_mix_bytes(hash, &scenario_seed.to_le_bytes());
    hash = fnv1a_mix_field(hash, stream.variant().as_bytes());
    hash = fnv1a_mix_field(hash, stream.branch().as_bytes());
    hash = fnv1a_mix_field(hash, &stream.level().to_le_bytes());
    hash = fnv1a_mix_field(hash, stream.domain().as_bytes());
    hash = fnv1a_mix_field(hash, stream.model().as_bytes());
    hash
}

/// Stable name of the derivation algorithm, exposed so audit records remain
/// self-describing if a future `-v3` is ever introduced.
pub const ALGORITHM_NAME: &str = "FNV1a-StreamIdentity-v2";

/// Reproducibility trace for a single seed derivation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedDerivationAudit {
    pub scenario_seed: u64,
    pub stream: StreamIdentity,
    pub algorithm_name: &'static str,
    pub derived_seed: u64,
}

/// Derive a seed and return it together with its audit record.
pub fn derive_seed_with_audit(scenario_seed: u64, stream: &StreamIdentity) -> SeedDerivationAudit {
    SeedDerivationAudit {
        scenario_seed,
        stream: stream.clone(),
        algorithm_name: ALGORITHM_NAME,
        derived_seed: derive_seed(scenario_seed, stream),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(variant: &str, branch: &str) -> StreamIdentity {
        StreamIdentity::new(variant, branch, 1, "geo.plates", "0").unwrap()
    }

    #[test]
    fn derivation_is_deterministic() {
        let s = stream("science", "trunk");
        assert_eq!(derive_seed(7, &s), derive_seed(7, &s));
    }

    #[test]
    fn different_scenario_seeds_diverge() {
        let s = stream("science", "trunk");
        assert_ne!(derive_seed(1, &s), derive_seed(2, &s));
    }

    #[test]
    fn length_prefixing_prevents_concatenation_collisions() {
        // ("a", "bc") vs ("ab", "c") — same concatenation, different split.
        let s1 = StreamIdentity::new("a", "bc", 0, "x", "m").unwrap();
        let s2 = StreamIdentity::new("ab", "c", 0, "x", "m").unwrap();
        assert_ne!(derive_seed(99, &s1), derive_seed(99, &s2));
    }

    #[test]
    fn audit_record_carries_algorithm_name() {
        let s = stream("science", "trunk");
        let audit = derive_seed_with_audit(42, &s);
        assert_eq!(audit.algorithm_name, "FNV1a-StreamIdentity-v2");
        assert_eq!(audit.derived_seed, derive_seed(42, &s));
        assert_eq!(audit.scenario_seed, 42);
    }
}
