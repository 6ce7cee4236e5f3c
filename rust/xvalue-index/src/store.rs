//! Positioned access to the two index files.
//!
//! Neither [`IndexFile`] nor the underlying [`ReadAt`] keeps a cursor: every read
//! names its position. Sequential decoding goes through a [`NumCursor`], which is
//! owned by exactly one consumer (an iterator or a scan), so concurrent queries
//! never share decoding state. A cursor holds no file handle; it is handed the
//! file on every call, which lets [`SharedFiles::close`] release the files while
//! iterators are still alive.

use std::{
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};

use bytes::Bytes;
use xvalue_common::{Result, error::Error};
use xvalue_io::{FileReader, ReadAt};

use crate::num::{self, MAX_NUM_LEN, OFFSET_LEN};

/// Preferred number of bytes fetched when a cursor refills its window.
const CURSOR_WINDOW: usize = 4 * 1024;

/// One of the two files backing a value index.
#[derive(Clone)]
pub struct IndexFile {
    /// Name used as context in error messages.
    name: Arc<str>,
    reader: Arc<dyn ReadAt>,
    len: u64,
}

impl IndexFile {
    /// Wraps an arbitrary positional reader.
    pub fn new(name: impl Into<Arc<str>>, reader: Arc<dyn ReadAt>) -> Result<IndexFile> {
        let name = name.into();
        let len = reader
            .size()
            .map_err(|e| Error::io(name.to_string(), e))?;
        Ok(IndexFile { name, reader, len })
    }

    /// Opens a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<IndexFile> {
        let path = path.as_ref();
        let reader =
            FileReader::open(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        IndexFile::new(path.display().to_string(), Arc::new(reader))
    }

    /// Replaces the underlying reader with an in-memory copy of the whole file.
    pub fn preload(self) -> Result<IndexFile> {
        let content: Bytes =
            xvalue_io::read_fully(&self.reader).map_err(|e| self.io_error(e))?;
        let len = content.len() as u64;
        Ok(IndexFile {
            name: self.name,
            reader: Arc::new(content),
            len,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the compressed number at `pos`, returning it with the position
    /// immediately following it.
    pub fn read_num(&self, pos: u64) -> Result<(u32, u64)> {
        let bytes = self.read_bytes(pos, MAX_NUM_LEN)?;
        let (value, len) = num::decode(&bytes).map_err(|_| self.corrupted(pos))?;
        Ok((value, pos + len as u64))
    }

    /// Reads the 5-byte offset at `pos`.
    pub fn read_offset(&self, pos: u64) -> Result<u64> {
        let bytes = self.read_bytes(pos, OFFSET_LEN)?;
        num::decode_offset(&bytes).map_err(|_| self.corrupted(pos))
    }

    fn read_bytes(&self, pos: u64, len: usize) -> Result<Bytes> {
        let end = pos.saturating_add(len as u64).min(self.len);
        if pos >= end {
            return Err(self.corrupted(pos));
        }
        self.reader.read_at(pos..end).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, e: std::io::Error) -> Error {
        Error::io(self.name.to_string(), e)
    }

    #[cold]
    fn corrupted(&self, pos: u64) -> Error {
        Error::corrupted(
            self.name.to_string(),
            format!("truncated entry at offset {pos} (file size {})", self.len),
        )
    }
}

impl std::fmt::Debug for IndexFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexFile")
            .field("name", &self.name)
            .field("len", &self.len)
            .finish()
    }
}

/// Forward-only decoder of consecutive compressed numbers.
///
/// Reads the file through a window so that decoding a posting list does not
/// issue one request per number. A cursor created with [`bounded`](Self::bounded)
/// never reads past the bytes its expected numbers can occupy.
#[derive(Debug, Clone)]
pub struct NumCursor {
    window: Bytes,
    /// File position of the first window byte; never above `pos`.
    window_start: u64,
    pos: u64,
    /// End of the bytes the expected numbers can occupy, if known.
    limit: Option<u64>,
}

impl NumCursor {
    /// Creates a cursor positioned at `pos`.
    pub fn new(pos: u64) -> NumCursor {
        NumCursor {
            window: Bytes::new(),
            window_start: pos,
            pos,
            limit: None,
        }
    }

    /// Creates a cursor positioned at `pos` that will decode at most `nums`
    /// numbers.
    pub fn bounded(pos: u64, nums: u32) -> NumCursor {
        let mut cursor = NumCursor::new(pos);
        cursor.expect(nums);
        cursor
    }

    /// Declares that at most `nums` further numbers will be decoded.
    pub fn expect(&mut self, nums: u32) {
        self.limit = Some(self.pos.saturating_add(nums as u64 * MAX_NUM_LEN as u64));
    }

    /// Moves the cursor to `pos`, keeping the window if it covers `pos`.
    pub fn seek(&mut self, pos: u64) {
        let window_end = self.window_start + self.window.len() as u64;
        if pos < self.window_start || pos > window_end {
            self.window = Bytes::new();
            self.window_start = pos;
        }
        self.pos = pos;
    }

    /// Position of the next number to be decoded.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Decodes the next number from `file` and advances past it.
    ///
    /// A cursor must always be used with the same file.
    pub fn next_num(&mut self, file: &IndexFile) -> Result<u32> {
        let offset = (self.pos - self.window_start) as usize;
        let (value, len) = match self.window.get(offset..).map(num::decode) {
            Some(Ok(decoded)) => decoded,
            _ => {
                self.refill(file)?;
                num::decode(&self.window).map_err(|_| file.corrupted(self.pos))?
            }
        };
        self.pos += len as u64;
        Ok(value)
    }

    fn refill(&mut self, file: &IndexFile) -> Result<()> {
        let mut want = file.reader.storage_profile().clamp_io_size(CURSOR_WINDOW) as u64;
        if let Some(limit) = self.limit {
            want = want.min(limit.saturating_sub(self.pos));
        }
        let end = self
            .pos
            .saturating_add(want.max(MAX_NUM_LEN as u64))
            .min(file.len);
        self.window = if self.pos < end {
            file.reader
                .read_at(self.pos..end)
                .map_err(|e| file.io_error(e))?
        } else {
            Bytes::new()
        };
        self.window_start = self.pos;
        Ok(())
    }
}

/// The list file and the reference file of one index instance.
#[derive(Debug, Clone)]
pub struct FileSet {
    pub list: IndexFile,
    pub refs: IndexFile,
}

impl FileSet {
    /// Combined size of both files in bytes.
    pub fn disk_size(&self) -> u64 {
        self.list.len() + self.refs.len()
    }
}

/// File handles shared by an index and all iterators created from it.
///
/// Every read runs under the shared side of the lock, and [`close`](Self::close)
/// takes the exclusive side: closing waits for in-flight reads and makes every
/// later read fail with an "index closed" error.
#[derive(Debug)]
pub struct SharedFiles {
    files: RwLock<Option<FileSet>>,
}

impl SharedFiles {
    pub fn new(files: FileSet) -> SharedFiles {
        SharedFiles {
            files: RwLock::new(Some(files)),
        }
    }

    /// Runs `f` against the open files.
    pub fn with<R>(&self, f: impl FnOnce(&FileSet) -> Result<R>) -> Result<R> {
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        match files.as_ref() {
            Some(files) => f(files),
            None => Err(Error::index_closed()),
        }
    }

    /// Releases the files. Returns `false` if they were already released.
    pub fn close(&self) -> bool {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
