use std::sync::{PoisonError, RwLock};

use ahash::AHashMap;

/// Location of a resolved posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// Number of postings.
    pub count: u32,
    /// List file offset of the first posting, just past the count field.
    pub offset: u64,
}

/// Memoizes value lookups so that repeated queries skip the binary search.
///
/// Entries are never evicted and never go stale: the index is read-only for its
/// whole lifetime. A disabled cache answers every lookup with a miss and drops
/// every insert.
#[derive(Debug)]
pub struct LookupCache {
    enabled: bool,
    entries: RwLock<AHashMap<Box<[u8]>, CacheEntry>>,
}

impl LookupCache {
    pub fn new(enabled: bool) -> LookupCache {
        LookupCache {
            enabled,
            entries: Default::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, value: &[u8]) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(value)
            .copied()
    }

    pub fn insert(&self, value: &[u8], entry: CacheEntry) {
        if !self.enabled {
            return;
        }
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(value) {
            entries.insert(value.into(), entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
