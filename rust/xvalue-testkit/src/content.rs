use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use xvalue_common::{Result, error::Error};
use xvalue_index::{ContentStore, Pre, ValueKind};

/// Content store keeping texts and attribute values in memory.
///
/// Counts the texts it resolves, so tests can observe how much content a query
/// touched (e.g. to tell a cache hit from a binary search).
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    texts: Vec<Option<Bytes>>,
    attributes: Vec<Option<Bytes>>,
    resolved: AtomicU64,
}

impl MemoryContentStore {
    pub fn new() -> MemoryContentStore {
        Default::default()
    }

    /// Stores `value` at position `pre`, replacing any previous value.
    pub fn insert(&mut self, pre: Pre, kind: ValueKind, value: impl Into<Bytes>) {
        let values = self.values_mut(kind);
        let pre = pre as usize;
        if values.len() <= pre {
            values.resize(pre + 1, None);
        }
        values[pre] = Some(value.into());
    }

    /// Number of `text` calls served so far.
    pub fn resolved(&self) -> u64 {
        self.resolved.load(Ordering::Relaxed)
    }

    pub fn reset_resolved(&self) {
        self.resolved.store(0, Ordering::Relaxed);
    }

    fn values(&self, kind: ValueKind) -> &[Option<Bytes>] {
        match kind {
            ValueKind::Text => &self.texts,
            ValueKind::Attribute => &self.attributes,
        }
    }

    fn values_mut(&mut self, kind: ValueKind) -> &mut Vec<Option<Bytes>> {
        match kind {
            ValueKind::Text => &mut self.texts,
            ValueKind::Attribute => &mut self.attributes,
        }
    }
}

impl ContentStore for MemoryContentStore {
    fn text(&self, pre: Pre, kind: ValueKind) -> Result<Bytes> {
        self.resolved.fetch_add(1, Ordering::Relaxed);
        self.values(kind)
            .get(pre as usize)
            .cloned()
            .flatten()
            .ok_or_else(|| Error::invalid_arg("pre", format!("no {kind} at position {pre}")))
    }
}
