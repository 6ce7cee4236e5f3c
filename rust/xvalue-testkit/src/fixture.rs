//! Value index files for synthetic documents.
//!
//! [`FixtureBuilder`] collects the values of a document together with their
//! positions and lays them out exactly as the index reader expects them: values
//! deduplicated and ordered by raw bytes, posting lists ascending and
//! delta-encoded.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use bytes::Bytes;
use xvalue_index::{Pre, ValueIndex, ValueIndexOptions, ValueKind, num};
use xvalue_io::{FileWriter, SealingWrite};

use crate::content::MemoryContentStore;

#[derive(Debug, Default)]
pub struct FixtureBuilder {
    kind: ValueKind,
    content: MemoryContentStore,
    postings: BTreeMap<Bytes, Vec<Pre>>,
}

impl FixtureBuilder {
    pub fn new(kind: ValueKind) -> FixtureBuilder {
        FixtureBuilder {
            kind,
            ..Default::default()
        }
    }

    /// Places `value` at position `pre`.
    ///
    /// Each position may hold one value; placing a second one is a test bug.
    pub fn add(&mut self, pre: Pre, value: impl Into<Bytes>) -> &mut Self {
        let value = value.into();
        self.content.insert(pre, self.kind, value.clone());
        let pres = self.postings.entry(value).or_default();
        assert!(!pres.contains(&pre), "position {pre} placed twice");
        pres.push(pre);
        self
    }

    /// Places `values` at consecutive positions starting with `first`.
    pub fn add_all<I, V>(&mut self, first: Pre, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bytes>,
    {
        for (pre, value) in (first..).zip(values) {
            self.add(pre, value);
        }
        self
    }

    /// Places a value in the content store without indexing it.
    pub fn add_unindexed(&mut self, pre: Pre, value: impl Into<Bytes>) -> &mut Self {
        self.content.insert(pre, self.kind, value);
        self
    }

    /// Encodes the index files.
    pub fn finish(self) -> anyhow::Result<Fixture> {
        let mut list = Vec::new();
        let mut refs = Vec::new();
        num::encode(u32::try_from(self.postings.len())?, &mut list);
        let mut postings = BTreeMap::new();
        for (value, mut pres) in self.postings {
            pres.sort_unstable();
            num::encode_offset(list.len() as u64, &mut refs)?;
            num::encode(u32::try_from(pres.len())?, &mut list);
            let mut last = 0;
            for &pre in &pres {
                num::encode(pre - last, &mut list);
                last = pre;
            }
            postings.insert(value, pres);
        }
        Ok(Fixture {
            kind: self.kind,
            content: Arc::new(self.content),
            postings,
            list,
            refs,
        })
    }
}

/// Encoded index files of a synthetic document, with its content and the
/// expected posting lists.
#[derive(Debug)]
pub struct Fixture {
    pub kind: ValueKind,
    pub content: Arc<MemoryContentStore>,
    /// Expected posting list of every indexed value.
    pub postings: BTreeMap<Bytes, Vec<Pre>>,
    pub list: Vec<u8>,
    pub refs: Vec<u8>,
}

impl Fixture {
    /// Opens the index from memory with default options.
    pub fn open(&self) -> anyhow::Result<ValueIndex> {
        self.open_with(ValueIndexOptions::new())
    }

    /// Opens the index from memory; the kind of the options is overridden by the
    /// fixture's kind.
    pub fn open_with(&self, options: ValueIndexOptions) -> anyhow::Result<ValueIndex> {
        let index = options.kind(self.kind).open_with(
            Arc::new(self.list.clone()),
            Arc::new(self.refs.clone()),
            self.content.clone(),
        )?;
        Ok(index)
    }

    /// Writes both index files into `dir`, named after the fixture's kind.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> anyhow::Result<()> {
        let dir = dir.as_ref();
        for (name, data) in [
            (self.kind.list_file(), &self.list),
            (self.kind.refs_file(), &self.refs),
        ] {
            let mut writer = FileWriter::create(dir.join(name))?;
            writer.write_all(data)?;
            writer.seal()?;
        }
        Ok(())
    }

    /// Writes both index files into a new temporary directory.
    pub fn write_to_temp_dir(&self) -> anyhow::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        self.write_to(dir.path())?;
        Ok(dir)
    }

    /// Positions whose value parses to a number within `min..=max`, ascending.
    pub fn expected_range(&self, min: f64, max: f64) -> Vec<Pre> {
        let mut pres: Vec<Pre> = self
            .postings
            .iter()
            .filter(|(value, _)| {
                let v = xvalue_index::token::parse_number(value);
                v >= min && v <= max
            })
            .flat_map(|(_, pres)| pres.iter().copied())
            .collect();
        pres.sort_unstable();
        pres
    }
}
