//! Seeded generation of synthetic documents.

use xvalue_index::ValueKind;

use crate::fixture::{Fixture, FixtureBuilder};

const WORDS: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "Omega", "zeta", "eta", "theta", "iota", "kappa",
    "lambda", "mu", "\u{e9}t\u{e9}", "_id", "a b",
];

/// Generates a document of `count` values, mixing plain integers up to
/// `max_number`, decimal fractions, signed numbers and words.
///
/// Numbers are written in plain non-negative decimal form unless
/// `signed_numbers` is set; generation is deterministic for a given `seed`.
pub fn generate_document(
    kind: ValueKind,
    count: u32,
    max_number: u32,
    signed_numbers: bool,
    seed: u64,
) -> anyhow::Result<Fixture> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut builder = FixtureBuilder::new(kind);
    for pre in 0..count {
        let value = match rng.u8(0..10) {
            0..=4 => rng.u32(0..=max_number).to_string(),
            5 => format!("{}.{}", rng.u32(0..=max_number), rng.u8(1..10)),
            6 if signed_numbers => format!("-{}", rng.u32(1..=max_number.max(1))),
            _ => WORDS[rng.usize(0..WORDS.len())].to_string(),
        };
        builder.add(pre, value);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use xvalue_index::ValueKind;

    use super::generate_document;

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate_document(ValueKind::Text, 200, 50, true, 7).unwrap();
        let b = generate_document(ValueKind::Text, 200, 50, true, 7).unwrap();
        assert_eq!(a.list, b.list);
        assert_eq!(a.refs, b.refs);
        let total: usize = a.postings.values().map(Vec::len).sum();
        assert_eq!(total, 200);
    }
}
