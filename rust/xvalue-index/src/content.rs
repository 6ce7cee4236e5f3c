use bytes::Bytes;
use xvalue_common::Result;

use crate::{Pre, kind::ValueKind, token};

/// Resolves position references to the values stored in the document.
///
/// The value index stores no value bytes of its own: every comparison during a
/// lookup or a range scan goes through this trait. Implementations are expected
/// to answer in constant time and must be safe to call from concurrent queries.
pub trait ContentStore: Send + Sync + 'static {
    /// Raw text of the node or attribute at `pre`.
    fn text(&self, pre: Pre, kind: ValueKind) -> Result<Bytes>;

    /// Numeric value of the text at `pre`, or NaN if it is not a number.
    fn text_num(&self, pre: Pre, kind: ValueKind) -> Result<f64> {
        Ok(token::parse_number(&self.text(pre, kind)?))
    }

    /// Length in bytes of the text at `pre`.
    fn text_len(&self, pre: Pre, kind: ValueKind) -> Result<usize> {
        Ok(self.text(pre, kind)?.len())
    }
}

impl<T> ContentStore for std::sync::Arc<T>
where
    T: ContentStore + ?Sized,
{
    fn text(&self, pre: Pre, kind: ValueKind) -> Result<Bytes> {
        self.as_ref().text(pre, kind)
    }

    fn text_num(&self, pre: Pre, kind: ValueKind) -> Result<f64> {
        self.as_ref().text_num(pre, kind)
    }

    fn text_len(&self, pre: Pre, kind: ValueKind) -> Result<usize> {
        self.as_ref().text_len(pre, kind)
    }
}
