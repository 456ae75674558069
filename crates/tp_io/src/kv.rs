//! crates/tp_io/src/kv.rs
//! The ordered KV abstraction (C1, spec §4.1/§6.1): byte-key -> byte-value
//! store with atomic single-key put, prefix iteration in lexicographic key
//! order, and a reverse-prefix lookup for "largest key under prefix". The
//! physical storage engine is out of scope (spec §1) — `MemKv` is the
//! in-memory reference implementation spec §1 says tests may assume.

use std::collections::BTreeMap;
use std::sync::RwLock;

/// Ordered, byte-keyed key/value store. `put` is atomic per key
/// (last-writer-wins); no cross-key transactions are required (spec §4.1).
/// Implementations MUST tolerate concurrent readers and linearize writes
/// per key (spec §5).
pub trait OrderedKv: Send + Sync {
    fn put(&self, key: &[u8], value: &[u8]);

    fn try_get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn delete(&self, key: &[u8]);

    /// Ascending-key iteration over every entry whose key starts with
    /// `prefix`.
    fn seek_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;

    /// The entry with the largest key under `prefix`, or `None` if no key
    /// under that prefix exists. Used by snapshot "latest before" lookups
    /// and by the event store's `get_last_sequence` (spec §4.3, §4.4).
    fn seek_last_under_prefix(&self, prefix: &[u8]) -> Option<(Vec<u8>, Vec<u8>)>;
}

/// `BTreeMap`-backed reference implementation of `OrderedKv` (spec §6.6).
/// Prefix iteration is a `BTreeMap` range scan; `seek_last_under_prefix` is
/// bounded by the prefix's successor key so it never reads past the
/// prefix's key space.
#[derive(Default)]
pub struct MemKv {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemKv {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
        }
    }

    /// The lexicographic successor of `prefix` as an upper bound (exclusive)
    /// for range scans: increment the last byte that isn't already `0xFF`,
    /// truncating the bytes after it. `None` means "no upper bound" (the
    /// prefix is all `0xFF` bytes or empty).
    fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
        let mut bound = prefix.to_vec();
        while let Some(&last) = bound.last() {
            if last == 0xFF {
                bound.pop();
            } else {
                let new_len = bound.len();
                bound[new_len - 1] = last + 1;
                return Some(bound);
            }
        }
        None
    }
}

impl OrderedKv for MemKv {
    fn put(&self, key: &[u8], value: &[u8]) {
        let mut guard = self.inner.write().expect("MemKv lock poisoned");
        guard.insert(key.to_vec(), value.to_vec());
    }

    fn try_get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let guard = self.inner.read().expect("MemKv lock poisoned");
        guard.get(key).cloned()
    }

    fn delete(&self, key: &[u8]) {
        let mut guard = self.inner.write().expect("MemKv lock poisoned");
        guard.remove(key);
    }

    fn seek_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let guard = self.inner.read().expect("MemKv lock poisoned");
        let range = match Self::prefix_upper_bound(prefix) {
            Some(upper) => guard.range(prefix.to_vec()..upper),
            None => guard.range(prefix.to_vec()..),
        };
        range
            .map(|(k, v)| (k.clone(), v.clone()))
            .filter(|(k, _)| k.starts_with(prefix))
            .collect()
    }

    fn seek_last_under_prefix(&self, prefix: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
        let guard = self.inner.read().expect("MemKv lock poisoned");
        let range = match Self::prefix_upper_bound(prefix) {
            Some(upper) => guard.range(prefix.to_vec()..upper),
            None => guard.range(prefix.to_vec()..),
        };
        range
            .rev()
            .find(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
    }
}
