//! Human-readable document numbers (`PREFIX-NNNNNN`).
//!
//! The allocator is a pure function of the previously issued number. The
//! database layer stores that number per family and advances it under a row
//! lock, so numbers stay strictly increasing and are never reused.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-padding width of the numeric suffix.
pub const NUMBER_WIDTH: usize = 6;

/// Document families that carry a sequential number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFamily {
    /// `EST-######`
    Estimate,
    /// `INV-######`
    Invoice,
    /// `CN-######`
    CreditNote,
    /// `PRO-######`
    Proposal,
}

impl DocumentFamily {
    /// All numbered families.
    pub const ALL: [Self; 4] = [
        Self::Estimate,
        Self::Invoice,
        Self::CreditNote,
        Self::Proposal,
    ];

    /// Number prefix for this family.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Estimate => "EST",
            Self::Invoice => "INV",
            Self::CreditNote => "CN",
            Self::Proposal => "PRO",
        }
    }

    /// Key used for the family's row in the sequence table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Estimate => "estimate",
            Self::Invoice => "invoice",
            Self::CreditNote => "credit_note",
            Self::Proposal => "proposal",
        }
    }

    /// Parses a sequence table key.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    /// First number ever issued for this family.
    #[must_use]
    pub fn base_number(self) -> String {
        format_number(self.prefix(), 1)
    }

    /// Number that follows `last` in this family.
    #[must_use]
    pub fn next_after(self, last: Option<&str>) -> String {
        next_number(self.prefix(), last)
    }
}

impl fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Formats `ordinal` as `PREFIX-NNNNNN`.
///
/// Ordinals wider than six digits are printed in full, never truncated.
#[must_use]
pub fn format_number(prefix: &str, ordinal: u64) -> String {
    format!("{prefix}-{ordinal:0width$}", width = NUMBER_WIDTH)
}

/// Extracts the numeric suffix of `number` if it is `prefix-DIGITS`.
#[must_use]
pub fn parse_ordinal(prefix: &str, number: &str) -> Option<u64> {
    let mut parts = number.trim().split('-');
    let (head, tail) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || head != prefix {
        return None;
    }
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// Returns the number that follows `last`, or the base number when there is
/// no usable prior number.
///
/// Malformed input (wrong segment count, non-numeric suffix, overflow) falls
/// back to `PREFIX-000001` instead of failing.
#[must_use]
pub fn next_number(prefix: &str, last: Option<&str>) -> String {
    let next = last
        .and_then(|n| parse_ordinal(prefix, n))
        .and_then(|n| n.checked_add(1))
        .unwrap_or(1);
    format_number(prefix, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("EST-000042"), "EST-000043")]
    #[case(None, "EST-000001")]
    #[case(Some("EST"), "EST-000001")]
    #[case(Some("EST-"), "EST-000001")]
    #[case(Some("EST-12a"), "EST-000001")]
    #[case(Some("EST-1-2"), "EST-000001")]
    #[case(Some("EST-999999"), "EST-1000000")]
    #[case(Some(" EST-000009 "), "EST-000010")]
    fn test_next_estimate_number(#[case] last: Option<&str>, #[case] expected: &str) {
        assert_eq!(next_number("EST", last), expected);
    }

    #[test]
    fn test_family_prefixes() {
        assert_eq!(DocumentFamily::Invoice.base_number(), "INV-000001");
        assert_eq!(DocumentFamily::CreditNote.base_number(), "CN-000001");
        assert_eq!(
            DocumentFamily::CreditNote.next_after(Some("CN-000007")),
            "CN-000008"
        );
    }

    #[test]
    fn test_wrong_prefix_falls_back() {
        assert_eq!(
            DocumentFamily::Invoice.next_after(Some("EST-000042")),
            "INV-000001"
        );
    }

    #[test]
    fn test_overflow_falls_back() {
        let last = format!("INV-{}", u64::MAX);
        assert_eq!(next_number("INV", Some(&last)), "INV-000001");
    }

    #[test]
    fn test_family_key_roundtrip() {
        for family in DocumentFamily::ALL {
            assert_eq!(DocumentFamily::parse(family.as_str()), Some(family));
        }
        assert_eq!(DocumentFamily::parse("receipt"), None);
    }
}
