//! Index files on disk.

use std::{
    fs::File,
    io::{BufWriter, Write},
    ops::Range,
    path::Path,
};

use bytes::{Bytes, BytesMut};

use crate::{ReadAt, SealingWrite, StorageProfile, check_range};

/// Positioned reader over a file that does not change while it is open.
///
/// The size is taken once, when the file is opened.
#[derive(Debug)]
pub struct FileReader {
    file: File,
    size: u64,
}

impl FileReader {
    pub fn new(file: File) -> std::io::Result<FileReader> {
        let size = file.metadata()?.len();
        Ok(FileReader { file, size })
    }

    pub fn open(path: impl AsRef<Path>) -> std::io::Result<FileReader> {
        FileReader::new(File::open(path)?)
    }
}

impl ReadAt for FileReader {
    fn size(&self) -> std::io::Result<u64> {
        Ok(self.size)
    }

    fn read_at(&self, range: Range<u64>) -> std::io::Result<Bytes> {
        check_range(&range)?;
        let end = range.end.min(self.size);
        if range.start >= end {
            return Ok(Bytes::new());
        }
        let mut buf = BytesMut::zeroed((end - range.start) as usize);
        read_exact_at(&self.file, range.start, &mut buf)?;
        Ok(buf.freeze())
    }

    fn storage_profile(&self) -> StorageProfile {
        StorageProfile {
            min_io_size: 4 * 1024,
            max_io_size: 1024 * 1024,
        }
    }
}

/// Buffered writer creating a new file; fails if the file already exists.
#[derive(Debug)]
pub struct FileWriter {
    inner: Option<BufWriter<File>>,
}

impl FileWriter {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<FileWriter> {
        Ok(FileWriter {
            inner: Some(BufWriter::new(File::create_new(path)?)),
        })
    }

    fn sealed() -> std::io::Error {
        std::io::Error::other("file writer is sealed")
    }
}

impl SealingWrite for FileWriter {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.inner
            .as_mut()
            .ok_or_else(FileWriter::sealed)?
            .write_all(buf)
    }

    fn seal(&mut self) -> std::io::Result<()> {
        let writer = self.inner.take().ok_or_else(FileWriter::sealed)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, pos: u64, buf: &mut [u8]) -> std::io::Result<()> {
    std::os::unix::fs::FileExt::read_exact_at(file, buf, pos)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut pos: u64, mut buf: &mut [u8]) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        let n = file.seek_read(buf, pos)?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        buf = &mut buf[n..];
        pos += n as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        ReadAt, SealingWrite,
        file::{FileReader, FileWriter},
    };

    #[test]
    fn test_write_then_read_refs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("txtr");
        let mut writer = FileWriter::create(&path).unwrap();
        for slot in 0..10u8 {
            writer.write_all(&[0, 0, 0, 0, slot]).unwrap();
        }
        writer.seal().unwrap();
        assert!(writer.write_all(b"x").is_err());
        assert!(writer.seal().is_err());

        let reader = FileReader::open(&path).unwrap();
        assert_eq!(reader.size().unwrap(), 50);
        for slot in 0..10u64 {
            let entry = reader.read_at(slot * 5..slot * 5 + 5).unwrap();
            assert_eq!(entry.as_ref(), &[0, 0, 0, 0, slot as u8]);
        }
        assert_eq!(reader.read_at(48..60).unwrap().as_ref(), &[0, 9]);
        assert!(reader.read_at(60..64).unwrap().is_empty());
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("txtl");
        FileWriter::create(&path).unwrap().seal().unwrap();
        assert!(FileWriter::create(&path).is_err());
        assert!(FileReader::open(dir.path().join("atvl")).is_err());
    }
}
