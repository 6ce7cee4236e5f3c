//! Disk-resident index of text and attribute values.
//!
//! # File layout
//!
//! Each index instance consists of two files, named after its [`ValueKind`]:
//!
//! - **List file** (`txtl` / `atvl`): a compressed number holding the count of
//!   distinct values, followed by one posting list per distinct value. A posting
//!   list is a compressed count followed by that many compressed position
//!   references, the first absolute and every further one a delta to its
//!   predecessor.
//! - **Reference file** (`txtr` / `atvr`): one 5-byte list file offset per
//!   distinct value, ordered by the raw bytes of the value.
//!
//! The index stores no value bytes. The value of slot `i` is the text found in
//! the content store at the first position reference of its posting list.

use std::{cmp::Ordering, sync::Arc};

use log::{debug, trace};
use xvalue_common::{Result, error::Error, verify_data};

use crate::{
    Pre,
    cache::{CacheEntry, LookupCache},
    content::ContentStore,
    iter::ValueIterator,
    kind::ValueKind,
    num::OFFSET_LEN,
    query::{IndexToken, RangeToken},
    stats::IndexStats,
    store::{FileSet, NumCursor, SharedFiles},
    token,
};

/// Read-only value index over one [`ValueKind`] of a document.
///
/// All query methods take `&self` and may run concurrently. [`close`](Self::close)
/// waits for in-flight reads to finish; afterwards every query, including the
/// advancing of exact-match iterators created earlier, fails with an
/// "index closed" error.
pub struct ValueIndex {
    kind: ValueKind,
    /// Number of distinct values, read once at open.
    size: u32,
    files: Arc<SharedFiles>,
    content: Arc<dyn ContentStore>,
    cache: LookupCache,
    populate_cache_on_fetch: bool,
}

impl ValueIndex {
    pub(crate) fn new(
        kind: ValueKind,
        files: FileSet,
        content: Arc<dyn ContentStore>,
        cache: LookupCache,
        populate_cache_on_fetch: bool,
    ) -> Result<ValueIndex> {
        let (size, _) = files.list.read_num(0)?;
        verify_data!(files.refs.name(), files.refs.len() >= size as u64 * OFFSET_LEN as u64);
        debug!(
            "opened value index for {kind}: {size} distinct values, {} bytes",
            files.disk_size()
        );
        Ok(ValueIndex {
            kind,
            size,
            files: Arc::new(SharedFiles::new(files)),
            content,
            cache,
            populate_cache_on_fetch,
        })
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Number of distinct indexed values.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    pub fn is_closed(&self) -> bool {
        self.files.is_closed()
    }

    /// Combined size of both index files in bytes.
    pub fn disk_size(&self) -> Result<u64> {
        self.files.with(|files| Ok(files.disk_size()))
    }

    /// Returns the number of position references matching `token`.
    ///
    /// For an exact value, a successful lookup is memoized in the lookup cache.
    pub fn count(&self, token: IndexToken<'_>) -> Result<usize> {
        match token {
            IndexToken::Value(value) => self.count_value(value),
            IndexToken::Range(range) => Ok(self.fetch_range(range)?.size()),
        }
    }

    /// Returns the position references matching `token`, in ascending order.
    pub fn fetch(&self, token: IndexToken<'_>) -> Result<ValueIterator> {
        match token {
            IndexToken::Value(value) => self.fetch_value(value),
            IndexToken::Range(range) => self.fetch_range(range),
        }
    }

    /// Returns the positions of all values whose numeric interpretation lies
    /// within `range`, sorted ascending.
    ///
    /// Values are ordered by their bytes rather than their magnitude, so this is
    /// a scan over all distinct values. The scan stops early in two cases, both
    /// of which assume numbers are stored as plain non-negative decimals:
    ///
    /// - after numbers were seen, a non-numeric value starting above `'9'` ends
    ///   the block of numeric values;
    /// - when both bounds are integers of the same digit count, a value of that
    ///   digit count above `max` cannot be followed by a value in range.
    pub fn fetch_range(&self, range: RangeToken) -> Result<ValueIterator> {
        self.ensure_open()?;
        let pres = self.files.with(|files| self.scan_range(files, range))?;
        Ok(ValueIterator::buffered(pres))
    }

    /// Finds the list file offset of the posting list of `value`.
    ///
    /// The returned offset points at the posting count. The cache is neither
    /// consulted nor populated.
    pub fn locate(&self, value: &[u8]) -> Result<Option<u64>> {
        self.files.with(|files| self.binary_search(files, value))
    }

    /// Releases both index files.
    ///
    /// Closing an already closed index does nothing.
    pub fn close(&self) -> Result<()> {
        if self.files.close() {
            debug!("closed value index for {}", self.kind);
        }
        Ok(())
    }

    /// Returns a human-readable summary of the index: its size on disk and the
    /// distribution of its values.
    pub fn info(&self) -> Result<String> {
        self.files.with(|files| {
            let mut stats = IndexStats::new(self.kind, files.disk_size());
            for slot in 0..self.size as u64 {
                let offset = files.refs.read_offset(slot * OFFSET_LEN as u64)?;
                let (count, first) = files.list.read_num(offset)?;
                stats.record(count);
                if stats.wants(count) {
                    let (pre, _) = files.list.read_num(first)?;
                    stats.add_top(count, self.content.text(pre, self.kind)?);
                }
            }
            Ok(stats.to_string())
        })
    }

    fn count_value(&self, value: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        if let Some(entry) = self.cache.get(value) {
            return Ok(entry.count as usize);
        }
        let Some(entry) = self.lookup(value)? else {
            return Ok(0);
        };
        trace!("caching {} postings at offset {}", entry.count, entry.offset);
        self.cache.insert(value, entry);
        Ok(entry.count as usize)
    }

    fn fetch_value(&self, value: &[u8]) -> Result<ValueIterator> {
        self.ensure_open()?;
        if let Some(entry) = self.cache.get(value) {
            return Ok(self.postings(entry));
        }
        let Some(entry) = self.lookup(value)? else {
            return Ok(ValueIterator::empty());
        };
        if self.populate_cache_on_fetch {
            self.cache.insert(value, entry);
        }
        Ok(self.postings(entry))
    }

    /// Binary-searches `value` and reads its posting count.
    fn lookup(&self, value: &[u8]) -> Result<Option<CacheEntry>> {
        self.files.with(|files| {
            let Some(offset) = self.binary_search(files, value)? else {
                return Ok(None);
            };
            let (count, first) = files.list.read_num(offset)?;
            Ok(Some(CacheEntry {
                count,
                offset: first,
            }))
        })
    }

    fn postings(&self, entry: CacheEntry) -> ValueIterator {
        ValueIterator::postings(Arc::clone(&self.files), entry.count, entry.offset)
    }

    fn binary_search(&self, files: &FileSet, value: &[u8]) -> Result<Option<u64>> {
        let mut low = 0u64;
        let mut high = self.size as u64;
        while low < high {
            let mid = low + (high - low) / 2;
            let offset = files.refs.read_offset(mid * OFFSET_LEN as u64)?;
            let (_, first) = files.list.read_num(offset)?;
            let (pre, _) = files.list.read_num(first)?;
            let text = self.content.text(pre, self.kind)?;
            match token::diff(&text, value) {
                Ordering::Equal => return Ok(Some(offset)),
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
            }
        }
        Ok(None)
    }

    fn scan_range(&self, files: &FileSet, range: RangeToken) -> Result<Vec<Pre>> {
        let max_len = token::integral_len(range.max);
        let shortcut_len = max_len.filter(|&len| token::integral_len(range.min) == Some(len));

        let mut pres = Vec::new();
        let mut found = false;
        // Posting lists follow each other in slot order, so one cursor walks the
        // list file front to back.
        let mut cursor = NumCursor::new(0);
        for slot in 0..self.size as u64 {
            let offset = files.refs.read_offset(slot * OFFSET_LEN as u64)?;
            cursor.seek(offset);
            let count = cursor.next_num(&files.list)?;
            verify_data!(files.list.name(), count > 0);
            let first = cursor.next_num(&files.list)?;
            let value = self.content.text_num(first, self.kind)?;

            if !found {
                found = !value.is_nan();
                if !found || !range.contains(value) {
                    continue;
                }
            } else if !value.is_nan() {
                if let Some(len) = shortcut_len {
                    if value > range.max && self.content.text_len(first, self.kind)? == len {
                        trace!("range {range}: stopping at slot {slot}, past maximum");
                        break;
                    }
                }
                if !range.contains(value) {
                    continue;
                }
            } else {
                let text = self.content.text(first, self.kind)?;
                if text.first().is_some_and(|&b| b > b'9') {
                    trace!("range {range}: stopping at slot {slot}, past numeric values");
                    break;
                }
                continue;
            }

            pres.push(first);
            let mut pre = first;
            for _ in 1..count {
                let delta = cursor.next_num(&files.list)?;
                pre = pre.checked_add(delta).ok_or_else(|| {
                    Error::corrupted(
                        files.list.name(),
                        format!("position overflow in posting list at {offset}"),
                    )
                })?;
                pres.push(pre);
            }
        }
        pres.sort_unstable();
        Ok(pres)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.files.is_closed() {
            return Err(Error::index_closed());
        }
        Ok(())
    }
}

impl std::fmt::Debug for ValueIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueIndex")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use xvalue_common::{Result, error::Error};

    use crate::{
        IndexIterator, IndexToken, Pre, ValueIndexOptions, ValueKind, content::ContentStore, num,
        store::tests::CountingReader,
    };

    /// Texts addressed directly by position reference.
    struct Texts(Vec<&'static str>);

    impl ContentStore for Texts {
        fn text(&self, pre: Pre, _kind: ValueKind) -> Result<Bytes> {
            self.0
                .get(pre as usize)
                .map(|t| Bytes::from_static(t.as_bytes()))
                .ok_or_else(|| Error::invalid_arg("pre", pre.to_string()))
        }
    }

    /// Writes the two files for sorted, distinct `(value, postings)` pairs.
    fn layout(entries: &[(&str, &[Pre])]) -> (Vec<u8>, Vec<u8>) {
        let mut list = Vec::new();
        let mut refs = Vec::new();
        num::encode(entries.len() as u32, &mut list);
        for (_, pres) in entries {
            num::encode_offset(list.len() as u64, &mut refs).unwrap();
            num::encode(pres.len() as u32, &mut list);
            let mut last = 0;
            for &pre in pres.iter() {
                num::encode(pre - last, &mut list);
                last = pre;
            }
        }
        (list, refs)
    }

    fn open(texts: Vec<&'static str>, entries: &[(&str, &[Pre])]) -> crate::ValueIndex {
        let (list, refs) = layout(entries);
        ValueIndexOptions::new()
            .open_with(Arc::new(list), Arc::new(refs), Arc::new(Texts(texts)))
            .unwrap()
    }

    fn numbers() -> crate::ValueIndex {
        // Positions 5, 6, 7 hold "10", "20", "30".
        let mut texts = vec![""; 8];
        texts[5] = "10";
        texts[6] = "20";
        texts[7] = "30";
        open(texts, &[("10", &[5]), ("20", &[6]), ("30", &[7])])
    }

    #[test]
    fn test_exact_lookup() {
        let index = numbers();
        assert_eq!(index.size(), 3);
        let pres = index.fetch(IndexToken::value("20")).unwrap().collect_pres().unwrap();
        assert_eq!(pres, vec![6]);
        assert_eq!(index.count(IndexToken::value("20")).unwrap(), 1);

        assert!(index.fetch(IndexToken::value("99")).unwrap().collect_pres().unwrap().is_empty());
        assert_eq!(index.count(IndexToken::value("99")).unwrap(), 0);
        assert_eq!(index.locate(b"99").unwrap(), None);
    }

    #[test]
    fn test_range_scenario() {
        let index = numbers();
        let pres = index.fetch(IndexToken::range(15.0, 25.0)).unwrap().collect_pres().unwrap();
        assert_eq!(pres, vec![6]);
        assert_eq!(index.count(IndexToken::range(15.0, 25.0)).unwrap(), 1);
        assert_eq!(index.count(IndexToken::range(10.0, 30.0)).unwrap(), 3);
    }

    #[test]
    fn test_delta_decoding() {
        let index = open(vec!["", "5", "", "5"], &[("5", &[1, 3])]);
        let mut iter = index.fetch(IndexToken::value("5")).unwrap();
        assert!(iter.more());
        assert_eq!(iter.pre().unwrap(), 1);
        assert!(iter.more());
        assert_eq!(iter.pre().unwrap(), 3);
        assert!(!iter.more());
    }

    #[test]
    fn test_count_populates_cache_fetch_does_not() {
        let index = numbers();
        index.fetch(IndexToken::value("30")).unwrap();
        assert!(index.cache().is_empty());
        index.count(IndexToken::value("30")).unwrap();
        let entry = index.cache().get(b"30").unwrap();
        assert_eq!(entry.count, 1);
        assert_eq!(
            index.fetch(IndexToken::value("30")).unwrap().collect_pres().unwrap(),
            vec![7]
        );
    }

    #[test]
    fn test_empty_index() {
        let index = open(vec![], &[]);
        assert_eq!(index.size(), 0);
        assert_eq!(index.locate(b"").unwrap(), None);
        assert_eq!(index.fetch(IndexToken::value("a")).unwrap().count(), 0);
        assert_eq!(index.fetch(IndexToken::range(f64::MIN, f64::MAX)).unwrap().count(), 0);
        assert!(index.info().unwrap().contains("Distinct values: 0"));
    }

    #[test]
    fn test_close() {
        let index = numbers();
        let mut iter = index.fetch(IndexToken::value("10")).unwrap();
        let range = index.fetch(IndexToken::range(0.0, 100.0)).unwrap();
        index.close().unwrap();
        index.close().unwrap();
        assert!(index.is_closed());

        assert!(iter.more());
        assert!(iter.pre().unwrap_err().is_index_closed());
        assert!(index.count(IndexToken::value("10")).unwrap_err().is_index_closed());
        assert!(index.fetch(IndexToken::value("10")).unwrap_err().is_index_closed());
        assert!(index.locate(b"10").unwrap_err().is_index_closed());
        assert!(index.info().unwrap_err().is_index_closed());
        // Range results are materialized and survive the close.
        assert_eq!(range.collect_pres().unwrap(), vec![5, 6, 7]);
    }

    /// Position `pre` holds the word `w{pre:05}`, so values sort by position.
    struct Words;

    impl ContentStore for Words {
        fn text(&self, pre: Pre, _kind: ValueKind) -> Result<Bytes> {
            Ok(Bytes::from(format!("w{pre:05}")))
        }
    }

    #[test]
    fn test_reads_stay_proportional_to_list_file() {
        let postings: Vec<[Pre; 1]> = (0..20_000).map(|pre| [pre]).collect();
        let entries: Vec<(&str, &[Pre])> = postings.iter().map(|p| ("", &p[..])).collect();
        let (list, refs) = layout(&entries);
        let list_len = list.len() as u64;
        let reader = CountingReader::new(list);
        let index = ValueIndexOptions::new()
            .open_with(reader.clone(), Arc::new(refs), Arc::new(Words))
            .unwrap();

        // No value is numeric, so the scan visits every slot.
        reader.take_read();
        let pres = index.fetch(IndexToken::range(0.0, 1.0)).unwrap();
        assert_eq!(pres.size(), 0);
        let scanned = reader.take_read();
        // Windows overlap only by the few bytes of a number cut at a window end.
        assert!(scanned <= list_len * 101 / 100, "read {scanned} of {list_len} bytes");

        let iter = index.fetch(IndexToken::value("w12345")).unwrap();
        reader.take_read();
        assert_eq!(iter.collect_pres().unwrap(), vec![12345]);
        assert!(reader.take_read() <= num::MAX_NUM_LEN as u64);
    }

    #[test]
    fn test_truncated_refs_rejected() {
        let (list, mut refs) = layout(&[("10", &[5]), ("20", &[6])]);
        refs.truncate(7);
        let res = ValueIndexOptions::new().open_with(
            Arc::new(list),
            Arc::new(refs),
            Arc::new(Texts(vec![])),
        );
        assert!(res.is_err());
    }
}
