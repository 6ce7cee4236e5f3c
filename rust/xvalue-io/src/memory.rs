//! In-memory blobs: `Bytes` and `Vec<u8>` serve reads, `Vec<u8>` takes writes.

use std::ops::Range;

use bytes::Bytes;

use crate::{ReadAt, SealingWrite, StorageProfile, check_range};

/// Maps `range` onto a buffer of `len` bytes, clipping at the end.
fn clip(range: Range<u64>, len: usize) -> std::io::Result<Range<usize>> {
    check_range(&range)?;
    let len = len as u64;
    let start = range.start.min(len);
    let end = range.end.min(len);
    Ok(start as usize..end as usize)
}

fn memory_profile(len: usize) -> StorageProfile {
    StorageProfile {
        min_io_size: 1,
        max_io_size: len.clamp(1, StorageProfile::default().max_io_size),
    }
}

impl ReadAt for Bytes {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        Ok(self.slice(clip(range, self.len())?))
    }

    fn storage_profile(&self) -> StorageProfile {
        memory_profile(self.len())
    }
}

impl ReadAt for Vec<u8> {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.len() as u64)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        Ok(Bytes::copy_from_slice(&self[clip(range, self.len())?]))
    }

    fn storage_profile(&self) -> StorageProfile {
        memory_profile(self.len())
    }
}

impl SealingWrite for Vec<u8> {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.extend_from_slice(buf);
        Ok(())
    }

    fn seal(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use crate::{ReadAt, SealingWrite};

    #[test]
    fn test_vec_writer() {
        let mut list = Vec::<u8>::new();
        list.write_all(&[0x03, 0x41, 0x00]).unwrap();
        list.write_all(b"\x05").unwrap();
        list.seal().unwrap();
        assert_eq!(list, [0x03, 0x41, 0x00, 0x05]);
    }

    #[test]
    fn test_bytes_reader() {
        let refs = Bytes::from_static(b"\x00\x00\x00\x00\x01\x00\x00\x00\x00\x04");
        assert_eq!(refs.size().unwrap(), 10);
        assert_eq!(refs.read_at(5..10).unwrap().as_ref(), b"\x00\x00\x00\x00\x04");
        assert_eq!(refs.read_at(8..200).unwrap().as_ref(), b"\x00\x04");
        assert!(refs.read_at(11..15).unwrap().is_empty());
        assert_eq!(refs.storage_profile().max_io_size, 10);
    }

    #[test]
    fn test_shared_vec_reader() {
        let list = Arc::new(b"abcd123".to_vec()) as Arc<dyn ReadAt>;
        assert_eq!(list.read_at(1..3).unwrap().as_ref(), b"bc");
        assert_eq!(list.storage_profile().min_io_size, 1);
    }
}
