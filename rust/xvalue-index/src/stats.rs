//! Value distribution summary reported by [`ValueIndex::info`](crate::ValueIndex::info).

use std::fmt;

use bytes::Bytes;

use crate::kind::ValueKind;

/// Number of most frequent values listed.
const TOP_VALUES: usize = 10;

/// Longest value text printed before it is abbreviated.
const MAX_VALUE_CHARS: usize = 40;

/// Histogram buckets: bucket `b` holds posting counts in `2^(b-1)..2^b`.
const BUCKETS: usize = u32::BITS as usize + 1;

pub struct IndexStats {
    kind: ValueKind,
    disk_size: u64,
    values: u64,
    postings: u64,
    histogram: [u64; BUCKETS],
    /// Most frequent values, by descending count; ties in index order.
    top: Vec<(u32, Bytes)>,
}

impl IndexStats {
    pub fn new(kind: ValueKind, disk_size: u64) -> IndexStats {
        IndexStats {
            kind,
            disk_size,
            values: 0,
            postings: 0,
            histogram: [0; BUCKETS],
            top: Vec::with_capacity(TOP_VALUES + 1),
        }
    }

    /// Accounts one distinct value with `count` postings.
    pub fn record(&mut self, count: u32) {
        self.values += 1;
        self.postings += count as u64;
        self.histogram[bucket(count)] += 1;
    }

    /// Returns `true` if a value with `count` postings would enter the list of
    /// most frequent values.
    pub fn wants(&self, count: u32) -> bool {
        self.top.len() < TOP_VALUES || self.top.last().is_some_and(|&(c, _)| count > c)
    }

    pub fn add_top(&mut self, count: u32, text: Bytes) {
        let at = self.top.partition_point(|&(c, _)| c >= count);
        if at < TOP_VALUES {
            self.top.insert(at, (count, text));
            self.top.truncate(TOP_VALUES);
        }
    }
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Value index ({})", self.kind)?;
        writeln!(f, "- Size on disk: {}", format_size(self.disk_size))?;
        writeln!(f, "- Distinct values: {}", self.values)?;
        writeln!(f, "- Postings: {}", self.postings)?;
        if self.values == 0 {
            return Ok(());
        }
        writeln!(f, "- Posting list lengths:")?;
        for (b, &n) in self.histogram.iter().enumerate().filter(|&(_, &n)| n > 0) {
            let (low, high) = bucket_bounds(b);
            if low == high {
                writeln!(f, "  {low}: {n}")?;
            } else {
                writeln!(f, "  {low}-{high}: {n}")?;
            }
        }
        writeln!(f, "- Most frequent values:")?;
        for (count, text) in &self.top {
            writeln!(f, "  {} ({count}x)", abbreviate(text))?;
        }
        Ok(())
    }
}

fn bucket(count: u32) -> usize {
    (u32::BITS - count.leading_zeros()) as usize
}

fn bucket_bounds(b: usize) -> (u64, u64) {
    if b == 0 {
        (0, 0)
    } else {
        (1 << (b - 1), (1 << b) - 1)
    }
}

fn abbreviate(text: &[u8]) -> String {
    let text = String::from_utf8_lossy(text);
    if text.chars().count() <= MAX_VALUE_CHARS {
        format!("\"{text}\"")
    } else {
        let head: String = text.chars().take(MAX_VALUE_CHARS).collect();
        format!("\"{head}...\"")
    }
}

/// Formats a byte count with a binary unit.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} Bytes");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
