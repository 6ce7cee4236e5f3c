//! Disk-resident value index of an XML document store.
//!
//! The index maps every distinct text or attribute value of a document to the
//! ascending list of position references ("pre values") where it occurs. It
//! answers three kinds of questions:
//!
//! - **Exact match**: all positions holding a given value, found by a binary
//!   search over the values sorted by their raw bytes.
//! - **Cardinality**: how many positions hold a given value. Answers are
//!   memoized in a lookup cache.
//! - **Numeric range**: all positions whose value, read as a number, lies
//!   within inclusive bounds.
//!
//! Value bytes are not stored in the index itself; they are resolved through a
//! [`ContentStore`] supplied by the caller. The index is read-only and built
//! elsewhere.
//!
//! # Example
//!
//! ```ignore
//! use xvalue_index::{IndexToken, ValueIndexOptions, ValueKind};
//!
//! let index = ValueIndexOptions::new()
//!     .kind(ValueKind::Attribute)
//!     .open("/data/db", content)?;
//! let pres = index.fetch(IndexToken::value("de"))?.collect_pres()?;
//! let years = index.fetch(IndexToken::range(1990.0, 1999.0))?;
//! ```

pub mod cache;
pub mod content;
pub mod iter;
pub mod kind;
pub mod num;
pub mod options;
pub mod query;
pub mod stats;
pub mod store;
pub mod token;
pub mod values;

/// Position reference of a node or attribute in the document.
pub type Pre = u32;

pub use content::ContentStore;
pub use iter::{IndexIterator, NO_SCORE, ValueIterator};
pub use kind::ValueKind;
pub use options::ValueIndexOptions;
pub use query::{IndexToken, RangeToken};
pub use values::ValueIndex;
