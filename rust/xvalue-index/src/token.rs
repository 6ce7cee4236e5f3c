//! Byte-string and numeric-text helpers shared by lookups and range scans.

use std::cmp::Ordering;

/// Compares two byte strings by raw unsigned byte order; a proper prefix sorts first.
///
/// This is the order the reference file is sorted by. No collation is applied.
#[inline]
pub fn diff(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Parses a numeric text value, returning NaN if it is not a number.
///
/// Accepts an optional sign, decimal digits with an optional fraction, and an
/// optional exponent. Leading and trailing XML whitespace is ignored. Special
/// literals such as `INF` or `NaN` are not numbers.
pub fn parse_number(text: &[u8]) -> f64 {
    let text = trim_ws(text);
    if !is_decimal(text) {
        return f64::NAN;
    }
    std::str::from_utf8(text)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Returns the length of the canonical decimal text of `value` when it is a
/// non-negative integer whose text has no exponent, and `None` otherwise.
///
/// Texts of equal length in this form compare lexicographically exactly as their
/// numbers compare, which is what the range scan shortcut relies on.
pub fn integral_len(value: f64) -> Option<usize> {
    // Doubles print in plain decimal up to this magnitude.
    const MAX_PLAIN: f64 = 1e18;
    if value.is_nan() || value < 0.0 || value >= MAX_PLAIN || value.fract() != 0.0 {
        return None;
    }
    let mut n = value as u64;
    let mut len = 1;
    while n >= 10 {
        n /= 10;
        len += 1;
    }
    Some(len)
}

fn trim_ws(text: &[u8]) -> &[u8] {
    let is_ws = |b: &u8| matches!(b, b' ' | b'\t' | b'\n' | b'\r');
    let start = text.iter().position(|b| !is_ws(b)).unwrap_or(text.len());
    let end = text.iter().rposition(|b| !is_ws(b)).map_or(start, |e| e + 1);
    &text[start..end]
}

fn is_decimal(text: &[u8]) -> bool {
    let mut i = 0;
    if matches!(text.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_digits = count_digits(&text[i..]);
    i += int_digits;
    let mut frac_digits = 0;
    if text.get(i) == Some(&b'.') {
        i += 1;
        frac_digits = count_digits(&text[i..]);
        i += frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return false;
    }
    if matches!(text.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(text.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_digits = count_digits(&text[i..]);
        if exp_digits == 0 {
            return false;
        }
        i += exp_digits;
    }
    i == text.len()
}

fn count_digits(text: &[u8]) -> usize {
    text.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;

    #[test]
    fn test_diff() {
        assert_eq!(diff(b"10", b"10"), Ordering::Equal);
        assert_eq!(diff(b"10", b"100"), Ordering::Less);
        assert_eq!(diff(b"9", b"10"), Ordering::Greater);
        assert_eq!(diff(b"\xC3\xA9", b"z"), Ordering::Greater);
        assert_eq!(diff(b"", b"a"), Ordering::Less);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(b"20"), 20.0);
        assert_eq!(parse_number(b" -1.5\n"), -1.5);
        assert_eq!(parse_number(b"+.5"), 0.5);
        assert_eq!(parse_number(b"7."), 7.0);
        assert_eq!(parse_number(b"1e3"), 1000.0);
        assert_eq!(parse_number(b"2.5E-1"), 0.25);
        for text in [
            &b""[..],
            b" ",
            b"abc",
            b"12a",
            b"1e",
            b".",
            b"-",
            b"INF",
            b"NaN",
            b"inf",
            b"1 2",
            b"0x10",
        ] {
            assert!(parse_number(text).is_nan(), "{:?}", String::from_utf8_lossy(text));
        }
    }

    #[test]
    fn test_integral_len() {
        assert_eq!(integral_len(0.0), Some(1));
        assert_eq!(integral_len(9.0), Some(1));
        assert_eq!(integral_len(10.0), Some(2));
        assert_eq!(integral_len(25.0), Some(2));
        assert_eq!(integral_len(123_456.0), Some(6));
        assert_eq!(integral_len(2.5), None);
        assert_eq!(integral_len(-3.0), None);
        assert_eq!(integral_len(1e20), None);
        assert_eq!(integral_len(f64::NAN), None);
        assert_eq!(integral_len(f64::INFINITY), None);
    }
}
