//! @ai:module:intent Locale-independent natural ordering of names
//! @ai:module:layer domain
//! @ai:module:public_api natural_cmp
//! @ai:module:stateless true

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

/// @ai:intent Compare strings treating ASCII digit runs as numbers
/// @ai:post digit runs sort before text runs; leading zeros only break ties
/// @ai:effects pure
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut left_chunks = chunks(left);
    let mut right_chunks = chunks(right);

    loop {
        match (left_chunks.next(), right_chunks.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ordering = compare_chunks(&a, &b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn compare_chunks(left: &Chunk, right: &Chunk) -> Ordering {
    match (left, right) {
        (Chunk::Digits(a), Chunk::Digits(b)) => compare_digits(a, b),
        (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
        (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        (Chunk::Text(a), Chunk::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
    }
}

fn compare_digits(left: &str, right: &str) -> Ordering {
    let a = left.trim_start_matches('0');
    let b = right.trim_start_matches('0');

    a.len()
        .cmp(&b.len())
        .then_with(|| a.cmp(b))
        .then_with(|| left.len().cmp(&right.len()))
}

fn chunks(text: &str) -> impl Iterator<Item = Chunk<'_>> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(if digits {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sorted(items: &[&str]) -> Vec<String> {
        let mut items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        items.sort_by(|a, b| natural_cmp(a, b));
        items
    }

    #[test]
    fn test_numbers_compare_by_magnitude() {
        assert_eq!(
            sorted(&["q10", "q2", "q1", "q100"]),
            vec!["q1", "q2", "q10", "q100"]
        );
    }

    #[test]
    fn test_leading_zeros_break_ties() {
        assert_eq!(natural_cmp("a01", "a1"), Ordering::Greater);
        assert_eq!(natural_cmp("a01", "a2"), Ordering::Less);
        assert_eq!(natural_cmp("a1", "a1"), Ordering::Equal);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(natural_cmp("multi", "multi-variables"), Ordering::Less);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
    }

    #[test]
    fn test_digits_before_text() {
        assert_eq!(natural_cmp("1abc", "abc"), Ordering::Less);
        assert_eq!(natural_cmp("x9", "xa"), Ordering::Less);
    }

    #[test]
    fn test_benchmark_names() {
        assert_eq!(
            sorted(&[
                "simple-benchmark",
                "quarantine-benchmark",
                "concurrent-benchmark",
                "multi-variables-benchmark",
            ]),
            vec![
                "concurrent-benchmark",
                "multi-variables-benchmark",
                "quarantine-benchmark",
                "simple-benchmark",
            ]
        );
    }

    #[test]
    fn test_non_ascii_digits_are_text() {
        assert_eq!(natural_cmp("a\u{0663}", "a3"), Ordering::Greater);
    }
}
