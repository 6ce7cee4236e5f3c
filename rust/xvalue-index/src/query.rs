use std::fmt;

/// Inclusive numeric bounds of a range query.
///
/// Bounds follow IEEE semantics: a value matches iff `min <= v && v <= max`,
/// so a NaN value never matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeToken {
    pub min: f64,
    pub max: f64,
}

impl RangeToken {
    pub fn new(min: f64, max: f64) -> RangeToken {
        RangeToken { min, max }
    }

    /// Returns `true` if `value` lies within the bounds.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for RangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A value index query: either an exact key or a numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexToken<'a> {
    /// Exact value, compared byte-wise. No normalization is applied, so the key
    /// must be in the form produced when the index was built.
    Value(&'a [u8]),
    Range(RangeToken),
}

impl<'a> IndexToken<'a> {
    pub fn value(value: &'a (impl AsRef<[u8]> + ?Sized)) -> IndexToken<'a> {
        IndexToken::Value(value.as_ref())
    }

    pub fn range(min: f64, max: f64) -> IndexToken<'static> {
        IndexToken::Range(RangeToken::new(min, max))
    }
}

impl From<RangeToken> for IndexToken<'_> {
    fn from(range: RangeToken) -> Self {
        IndexToken::Range(range)
    }
}

impl<'a> From<&'a [u8]> for IndexToken<'a> {
    fn from(value: &'a [u8]) -> Self {
        IndexToken::Value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{IndexToken, RangeToken};

    #[test]
    fn test_range_contains() {
        let range = RangeToken::new(15.0, 25.0);
        assert!(range.contains(15.0));
        assert!(range.contains(25.0));
        assert!(!range.contains(25.5));
        assert!(!range.contains(f64::NAN));

        let point = RangeToken::new(20.0, 20.0);
        assert!(point.contains(20.0));
        assert!(!point.contains(20.000001));
    }

    #[test]
    fn test_token_constructors() {
        assert_eq!(IndexToken::value("20"), IndexToken::Value(b"20"));
        assert_eq!(
            IndexToken::range(1.0, 2.0),
            IndexToken::Range(RangeToken { min: 1.0, max: 2.0 })
        );
        assert_eq!(RangeToken::new(1.0, 2.0).to_string(), "[1, 2]");
    }
}
