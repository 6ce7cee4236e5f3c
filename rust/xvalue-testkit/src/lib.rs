//! Test utilities for the xvalue crates.
//!
//! - [`content`]: an in-memory content store resolving position references to texts
//! - [`fixture`]: writes value index files for a synthetic document
//! - [`data_gen`]: seeded generation of synthetic documents

pub mod content;
pub mod data_gen;
pub mod fixture;

pub use content::MemoryContentStore;
pub use fixture::{Fixture, FixtureBuilder};
