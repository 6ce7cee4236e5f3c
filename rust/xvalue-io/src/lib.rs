//! Byte-level access to index files.
//!
//! [`ReadAt`] serves positioned reads without a shared cursor, [`SealingWrite`]
//! appends and then commits. Both are implemented for in-memory buffers
//! ([`memory`]) and for files on disk ([`file`]).

use std::{ops::Range, sync::Arc};

use bytes::Bytes;

pub mod file;
pub mod memory;

pub use file::{FileReader, FileWriter};

/// Random-access reader over an immutable blob.
///
/// Every call names its own range, so one reader serves any number of
/// concurrent consumers.
pub trait ReadAt: Send + Sync + 'static {
    /// Size of the blob in bytes.
    fn size(&self) -> std::io::Result<u64>;

    /// Reads `range`, clipped to the end of the blob.
    ///
    /// A range starting at or past the end yields an empty buffer. A short read
    /// happens only at the end of the blob.
    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes>;

    /// Preferred request sizes for this reader.
    fn storage_profile(&self) -> StorageProfile {
        StorageProfile::default()
    }
}

/// Append-only writer whose output becomes durable on [`seal`](SealingWrite::seal).
pub trait SealingWrite: Send {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()>;

    /// Flushes and commits the written data. Later writes fail.
    fn seal(&mut self) -> std::io::Result<()>;
}

/// Request sizes that make good use of a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageProfile {
    /// Below this size the per-request overhead dominates.
    pub min_io_size: usize,
    pub max_io_size: usize,
}

impl StorageProfile {
    /// Clamps `size` into `min_io_size..=max_io_size`, never below one byte.
    pub fn clamp_io_size(&self, size: usize) -> usize {
        let min = self.min_io_size.max(1).min(self.max_io_size.max(1));
        let max = self.max_io_size.max(min);
        size.clamp(min, max)
    }
}

impl Default for StorageProfile {
    fn default() -> StorageProfile {
        StorageProfile {
            min_io_size: 4 * 1024,
            max_io_size: 4 * 1024 * 1024,
        }
    }
}

/// Reads a whole blob into memory, one profile-sized request at a time.
pub fn read_fully(reader: &dyn ReadAt) -> std::io::Result<Bytes> {
    let size = reader.size()?;
    let chunk = reader.storage_profile().clamp_io_size(usize::MAX) as u64;
    if size <= chunk {
        return reader.read_at(0..size);
    }
    let mut buf = Vec::with_capacity(size as usize);
    while (buf.len() as u64) < size {
        let pos = buf.len() as u64;
        let part = reader.read_at(pos..(pos + chunk).min(size))?;
        if part.is_empty() {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buf.extend_from_slice(&part);
    }
    Ok(buf.into())
}

/// Rejects reversed ranges.
pub(crate) fn check_range(range: &Range<u64>) -> std::io::Result<()> {
    if range.start > range.end {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("reversed read range {}..{}", range.start, range.end),
        ));
    }
    Ok(())
}

impl<T> ReadAt for Arc<T>
where
    T: ReadAt + ?Sized,
{
    fn size(&self) -> std::io::Result<u64> {
        (**self).size()
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        (**self).read_at(range)
    }

    fn storage_profile(&self) -> StorageProfile {
        (**self).storage_profile()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{ReadAt, StorageProfile, read_fully};

    #[test]
    fn test_clamp_io_size() {
        let profile = StorageProfile {
            min_io_size: 16,
            max_io_size: 64,
        };
        assert_eq!(profile.clamp_io_size(1), 16);
        assert_eq!(profile.clamp_io_size(40), 40);
        assert_eq!(profile.clamp_io_size(usize::MAX), 64);

        let degenerate = StorageProfile {
            min_io_size: 0,
            max_io_size: 0,
        };
        assert_eq!(degenerate.clamp_io_size(100), 1);
    }

    #[test]
    fn test_read_fully() {
        let blob: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let reader = Arc::new(blob.clone()) as Arc<dyn ReadAt>;
        let all = read_fully(&reader).unwrap();
        assert_eq!(all.as_ref(), blob.as_slice());

        let empty = Arc::new(Vec::<u8>::new()) as Arc<dyn ReadAt>;
        assert!(read_fully(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_reversed_range() {
        let blob = b"atvr".to_vec();
        #[allow(clippy::reversed_empty_ranges)]
        let err = blob.read_at(3..1).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
