//! crates/tp_core/src/rng.rs
//!
//! Deterministic, integer-only RNG utilities. The engine never touches OS
//! entropy: every random stream is seeded explicitly, either from a
//! scenario seed (see `seed.rs`) or from a derived per-stream seed.
//!
//! Cross-platform determinism: explicit seeding, explicit word-index
//! accounting, no floating point in the RNG itself.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Deterministic RNG used to derive ID bytes (§4.7) and any other
/// uniformly-distributed integer stream the engine needs.
///
/// Internally ChaCha20 with an explicit 32-byte seed derived from a 64-bit
/// seed (little-endian bytes in the first 8 positions; the rest zero). This
/// avoids endianness ambiguity and keeps the mapping stable across
/// platforms (pin ChaCha20Rng's version at the workspace level to keep the
/// stream itself stable across builds).
#[derive(Debug, Clone)]
pub struct IdRng {
    rng: ChaCha20Rng,
    words_consumed: u128,
}

impl IdRng {
    #[inline]
    pub fn from_seed_u64(seed: u64) -> Self {
        let mut seed32 = [0u8; 32];
        seed32[..8].copy_from_slice(&seed.to_le_bytes());
        Self {
            rng: ChaCha20Rng::from_seed(seed32),
            words_consumed: 0,
        }
    }

    /// Total number of 64-bit words drawn so far (saturating).
    #[inline]
    pub fn words_consumed(&self) -> u128 {
        self.words_consumed
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.words_consumed = self.words_consumed.saturating_add(1);
        self.rng.next_u64()
    }

    /// Fill `out` with bytes drawn from successive 64-bit words, little-endian.
    #[inline]
    pub fn fill_bytes(&mut self, out: &mut [u8]) {
        let mut i = 0;
        while i < out.len() {
            let word = self.next_u64().to_le_bytes();
            let take = core::cmp::min(8, out.len() - i);
            out[i..i + take].copy_from_slice(&word[..take]);
            i += take;
        }
    }

    /// Unbiased integer in `[0, n)` via rejection sampling (PCG "threshold"
    /// trick). Returns `None` if `n == 0`.
    #[inline]
    pub fn gen_range(&mut self, n: u64) -> Option<u64> {
        if n == 0 {
            return None;
        }
        let threshold = n.wrapping_neg() % n;
        loop {
            let x = self.next_u64();
            if x >= threshold {
                return Some(x % n);
            }
        }
    }

    /// Deterministic in-place Fisher-Yates shuffle.
    pub fn shuffle_in_place<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        if len <= 1 {
            return;
        }
        let mut i = len - 1;
        loop {
            let j = self.gen_range((i as u64) + 1).unwrap() as usize;
            slice.swap(i, j);
            if i == 0 {
                break;
            }
            i -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_stream_for_same_seed() {
        let mut a = IdRng::from_seed_u64(123456789);
        let mut b = IdRng::from_seed_u64(123456789);
        let seq_a: Vec<u64> = (0..16).map(|_| a.next_u64()).collect();
        let seq_b: Vec<u64> = (0..16).map(|_| b.next_u64()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = IdRng::from_seed_u64(1);
        let mut b = IdRng::from_seed_u64(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn gen_range_zero_is_none() {
        let mut rng = IdRng::from_seed_u64(0xDEADBEEF);
        assert_eq!(rng.gen_range(0), None);
    }

    #[test]
    fn fill_bytes_is_deterministic() {
        let mut a = IdRng::from_seed_u64(99);
        let mut b = IdRng::from_seed_u64(99);
        let mut buf_a = [0u8; 10];
        let mut buf_b = [0u8; 10];
        a.fill_bytes(&mut buf_a);
        b.fill_bytes(&mut buf_b);
        assert_eq!(buf_a, buf_b);
    }

    #[test]
    fn shuffle_is_deterministic() {
        let seed = 42u64;
        let mut a = IdRng::from_seed_u64(seed);
        let mut b = IdRng::from_seed_u64(seed);
        let mut xs: Vec<u32> = (0..16).collect();
        let mut ys: Vec<u32> = (0..16).collect();
        a.shuffle_in_place(&mut xs);
        b.shuffle_in_place(&mut ys);
        assert_eq!(xs, ys);
    }
}
