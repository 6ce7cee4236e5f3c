use std::{path::Path, sync::Arc};

use xvalue_common::Result;
use xvalue_io::ReadAt;

use crate::{
    cache::LookupCache,
    content::ContentStore,
    kind::ValueKind,
    store::{FileSet, IndexFile},
    values::ValueIndex,
};

/// Options for opening a value index.
#[derive(Debug, Clone)]
pub struct ValueIndexOptions {
    kind: ValueKind,
    cache: bool,
    populate_cache_on_fetch: bool,
    preload: bool,
}

impl Default for ValueIndexOptions {
    fn default() -> Self {
        ValueIndexOptions {
            kind: ValueKind::Text,
            cache: true,
            populate_cache_on_fetch: false,
            preload: false,
        }
    }
}

impl ValueIndexOptions {
    pub fn new() -> Self {
        Default::default()
    }

    /// Selects the indexed values: texts (default) or attribute values.
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Enables or disables the lookup cache. Enabled by default.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// Lets exact-match fetches populate the lookup cache as well.
    ///
    /// By default only [`ValueIndex::count`] populates the cache, while fetches
    /// merely consult it.
    pub fn populate_cache_on_fetch(mut self, enabled: bool) -> Self {
        self.populate_cache_on_fetch = enabled;
        self
    }

    /// Loads both index files into memory when opening. Disabled by default.
    pub fn preload(mut self, enabled: bool) -> Self {
        self.preload = enabled;
        self
    }

    /// Opens the index files of the configured kind inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error naming the file if either file cannot be opened or
    /// read, and a format error if the files are inconsistent.
    pub fn open(
        self,
        dir: impl AsRef<Path>,
        content: Arc<dyn ContentStore>,
    ) -> Result<ValueIndex> {
        let dir = dir.as_ref();
        let list = IndexFile::open(dir.join(self.kind.list_file()))?;
        let refs = IndexFile::open(dir.join(self.kind.refs_file()))?;
        self.open_files(list, refs, content)
    }

    /// Opens an index from arbitrary list and reference file sources.
    pub fn open_with(
        self,
        list: Arc<dyn ReadAt>,
        refs: Arc<dyn ReadAt>,
        content: Arc<dyn ContentStore>,
    ) -> Result<ValueIndex> {
        let list = IndexFile::new(self.kind.list_file(), list)?;
        let refs = IndexFile::new(self.kind.refs_file(), refs)?;
        self.open_files(list, refs, content)
    }

    fn open_files(
        self,
        list: IndexFile,
        refs: IndexFile,
        content: Arc<dyn ContentStore>,
    ) -> Result<ValueIndex> {
        let (list, refs) = if self.preload {
            (list.preload()?, refs.preload()?)
        } else {
            (list, refs)
        };
        ValueIndex::new(
            self.kind,
            FileSet { list, refs },
            content,
            LookupCache::new(self.cache),
            self.populate_cache_on_fetch,
        )
    }
}
