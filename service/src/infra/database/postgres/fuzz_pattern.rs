//! [`FuzzPattern`] definition.

use derive_more::Display;
use itertools::Itertools as _;
use postgres_types::{FromSql, ToSql};

/// `SIMILAR TO` pattern matching any of the words of a search input.
#[derive(Clone, Debug, Display, Eq, FromSql, PartialEq, ToSql)]
#[postgres(transparent)]
pub struct FuzzPattern(String);

impl FuzzPattern {
    /// Characters having special meaning in a `SIMILAR TO` pattern.
    const SPECIAL: &'static [char] = &[
        '\\', '%', '_', '|', '*', '+', '?', '{', '}', '(', ')', '[', ']',
    ];

    /// Creates a new [`FuzzPattern`] out of the given `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let words = input.split_whitespace().format_with("|", |word, f| {
            let escaped = word.chars().format_with("", |c, f| {
                if Self::SPECIAL.contains(&c) {
                    f(&format_args!("\\{c}"))
                } else {
                    f(&c)
                }
            });
            f(&format_args!("%{escaped}%"))
        });
        Self(format!("({words})"))
    }
}

#[cfg(test)]
mod spec {
    use super::FuzzPattern;

    #[test]
    fn matches_any_word() {
        assert_eq!(
            FuzzPattern::new("  review  shop ").to_string(),
            "(%review%|%shop%)",
        );
    }

    #[test]
    fn escapes_special_chars() {
        assert_eq!(
            FuzzPattern::new("50% a_b (c)").to_string(),
            r"(%50\%%|%a\_b%|%\(c\)%)",
        );
    }
}
