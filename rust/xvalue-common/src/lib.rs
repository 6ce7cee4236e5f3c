//! Error type and result alias shared by the xvalue crates.

pub mod error;
pub mod result;

pub use result::Result;
