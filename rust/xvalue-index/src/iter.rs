//! Lazy, single-pass iteration over query results.
//!
//! Both query paths hand out a [`ValueIterator`]. An exact-match iterator decodes
//! its posting list from the list file as it is advanced; a range iterator walks
//! a buffer that was collected and sorted by the scan. Neither can be restarted,
//! and a consumer that stops early has nothing to release.

use std::sync::Arc;

use xvalue_common::{Result, error::Error};

use crate::{
    Pre,
    store::{NumCursor, SharedFiles},
};

/// Score reported by indexes that do not rank their results.
pub const NO_SCORE: f64 = -1.0;

/// Capability set of an index result sequence.
///
/// Callers alternate [`more`](Self::more) and [`pre`](Self::pre):
///
/// ```ignore
/// while iter.more() {
///     let pre = iter.pre()?;
/// }
/// ```
pub trait IndexIterator {
    /// Advances to the next result and reports whether one exists.
    fn more(&mut self) -> bool;

    /// Returns the position reference of the current result.
    fn pre(&mut self) -> Result<Pre>;

    /// Relevance of the current result, or [`NO_SCORE`].
    fn score(&self) -> f64;
}

/// Result sequence of a value index query.
pub struct ValueIterator {
    source: Source,
}

enum Source {
    Empty,
    Postings(PostingSource),
    Buffered(BufferedSource),
}

/// Decodes a delta-encoded posting list on demand.
struct PostingSource {
    files: Arc<SharedFiles>,
    cursor: NumCursor,
    count: u32,
    /// Index of the current posting, `None` before the first `more()`.
    current: Option<u32>,
    /// Set once the current posting has been decoded.
    decoded: bool,
    /// Postings passed over by `more()` without being read.
    skipped: u32,
    /// Last decoded position reference.
    last: Pre,
}

struct BufferedSource {
    pres: Vec<Pre>,
    current: Option<usize>,
}

impl ValueIterator {
    /// An iterator without results.
    pub fn empty() -> ValueIterator {
        ValueIterator {
            source: Source::Empty,
        }
    }

    /// An iterator over the `count` postings whose delta encoding starts at list
    /// file offset `offset`.
    pub(crate) fn postings(files: Arc<SharedFiles>, count: u32, offset: u64) -> ValueIterator {
        ValueIterator {
            source: Source::Postings(PostingSource {
                files,
                cursor: NumCursor::bounded(offset, count),
                count,
                current: None,
                decoded: false,
                skipped: 0,
                last: 0,
            }),
        }
    }

    /// An iterator over already collected position references, which must be
    /// sorted ascending.
    pub fn buffered(pres: Vec<Pre>) -> ValueIterator {
        debug_assert!(pres.is_sorted());
        ValueIterator {
            source: Source::Buffered(BufferedSource {
                pres,
                current: None,
            }),
        }
    }

    /// Total number of results, including those already consumed.
    pub fn size(&self) -> usize {
        match &self.source {
            Source::Empty => 0,
            Source::Postings(p) => p.count as usize,
            Source::Buffered(b) => b.pres.len(),
        }
    }

    /// Consumes the remaining results into a vector.
    pub fn collect_pres(self) -> Result<Vec<Pre>> {
        self.collect()
    }
}

impl std::fmt::Debug for ValueIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            Source::Empty => "empty",
            Source::Postings(_) => "postings",
            Source::Buffered(_) => "buffered",
        };
        f.debug_struct("ValueIterator")
            .field("source", &source)
            .field("size", &self.size())
            .finish_non_exhaustive()
    }
}

impl IndexIterator for ValueIterator {
    fn more(&mut self) -> bool {
        match &mut self.source {
            Source::Empty => false,
            Source::Postings(p) => {
                let next = p.current.map_or(0, |c| c.saturating_add(1));
                if next >= p.count {
                    p.current = Some(p.count);
                    return false;
                }
                if p.current.is_some() && !p.decoded {
                    p.skipped += 1;
                }
                p.current = Some(next);
                p.decoded = false;
                true
            }
            Source::Buffered(b) => {
                let next = b.current.map_or(0, |c| c.saturating_add(1));
                b.current = Some(next.min(b.pres.len()));
                next < b.pres.len()
            }
        }
    }

    fn pre(&mut self) -> Result<Pre> {
        match &mut self.source {
            Source::Empty => Err(exhausted()),
            Source::Postings(p) => match p.current {
                Some(c) if c < p.count => {
                    if !p.decoded {
                        p.decode()?;
                    }
                    Ok(p.last)
                }
                _ => Err(exhausted()),
            },
            Source::Buffered(b) => b
                .current
                .and_then(|c| b.pres.get(c).copied())
                .ok_or_else(exhausted),
        }
    }

    fn score(&self) -> f64 {
        NO_SCORE
    }
}

impl PostingSource {
    /// Decodes the deltas up to the current posting, adding each to the running
    /// position. Skipped postings are decoded here as well.
    fn decode(&mut self) -> Result<()> {
        let pending = self.skipped + 1;
        let cursor = &mut self.cursor;
        let mut last = self.last;
        self.files.with(|files| {
            for _ in 0..pending {
                let delta = cursor.next_num(&files.list)?;
                last = last.checked_add(delta).ok_or_else(|| {
                    Error::corrupted(
                        "posting list",
                        format!("position overflow at offset {}", cursor.pos()),
                    )
                })?;
            }
            Ok(())
        })?;
        self.last = last;
        self.skipped = 0;
        self.decoded = true;
        Ok(())
    }
}

impl Iterator for ValueIterator {
    type Item = Result<Pre>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.more() {
            return None;
        }
        Some(self.pre())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let consumed = match &self.source {
            Source::Empty => 0,
            Source::Postings(p) => p.current.map_or(0, |c| (c as usize + 1).min(p.count as usize)),
            Source::Buffered(b) => b.current.map_or(0, |c| (c + 1).min(b.pres.len())),
        };
        let remaining = self.size() - consumed;
        (remaining, Some(remaining))
    }
}

#[cold]
fn exhausted() -> Error {
    Error::invalid_operation("no current result; call more() first")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        num,
        store::{FileSet, IndexFile, SharedFiles},
    };

    use super::{IndexIterator, NO_SCORE, ValueIterator};

    fn shared_list(deltas: &[u32]) -> (Arc<SharedFiles>, u64) {
        let mut list = Vec::new();
        num::encode(1, &mut list);
        num::encode(deltas.len() as u32, &mut list);
        let offset = list.len() as u64;
        for &d in deltas {
            num::encode(d, &mut list);
        }
        let files = FileSet {
            list: IndexFile::new("list", Arc::new(list)).unwrap(),
            refs: IndexFile::new("refs", Arc::new(vec![0, 0, 0, 0, 1])).unwrap(),
        };
        (Arc::new(SharedFiles::new(files)), offset)
    }

    #[test]
    fn test_postings_protocol() {
        let (files, offset) = shared_list(&[1, 2]);
        let mut iter = ValueIterator::postings(files, 2, offset);
        assert_eq!(iter.size(), 2);
        assert!(iter.more());
        assert_eq!(iter.pre().unwrap(), 1);
        assert_eq!(iter.score(), NO_SCORE);
        assert!(iter.more());
        assert_eq!(iter.pre().unwrap(), 3);
        // Reading the current result twice does not advance.
        assert_eq!(iter.pre().unwrap(), 3);
        assert!(!iter.more());
        assert!(!iter.more());
        assert!(iter.pre().is_err());
    }

    #[test]
    fn test_postings_skip_without_reading() {
        let (files, offset) = shared_list(&[4, 3, 10]);
        let mut iter = ValueIterator::postings(files, 3, offset);
        assert!(iter.more());
        assert!(iter.more());
        assert_eq!(iter.pre().unwrap(), 7);
        assert!(iter.more());
        assert_eq!(iter.pre().unwrap(), 17);
    }

    #[test]
    fn test_std_iterator() {
        let (files, offset) = shared_list(&[5, 1, 1, 100]);
        let iter = ValueIterator::postings(files, 4, offset);
        assert_eq!(iter.size_hint(), (4, Some(4)));
        assert_eq!(iter.collect_pres().unwrap(), vec![5, 6, 7, 107]);
    }

    #[test]
    fn test_closed_files() {
        let (files, offset) = shared_list(&[5, 1]);
        let mut iter = ValueIterator::postings(Arc::clone(&files), 2, offset);
        assert_eq!(iter.next().unwrap().unwrap(), 5);
        files.close();
        let err = iter.next().unwrap().unwrap_err();
        assert!(err.is_index_closed());
    }

    #[test]
    fn test_debug() {
        let iter = ValueIterator::buffered(vec![3, 8]);
        assert_eq!(
            format!("{iter:?}"),
            "ValueIterator { source: \"buffered\", size: 2, .. }"
        );
        let (files, offset) = shared_list(&[5]);
        let iter = ValueIterator::postings(files, 1, offset);
        assert!(format!("{iter:?}").contains("postings"));
    }

    #[test]
    fn test_buffered_and_empty() {
        let mut iter = ValueIterator::buffered(vec![2, 9, 9, 40]);
        assert_eq!(iter.size(), 4);
        assert!(iter.pre().is_err());
        assert!(iter.more());
        assert_eq!(iter.pre().unwrap(), 2);
        assert_eq!(iter.score(), NO_SCORE);
        assert_eq!(iter.collect_pres().unwrap(), vec![9, 9, 40]);

        let mut empty = ValueIterator::empty();
        assert!(!empty.more());
        assert!(empty.pre().is_err());
        assert_eq!(empty.size(), 0);
        assert_eq!(empty.count(), 0);
    }
}
