//! Property-based tests for document numbering.

use proptest::prelude::*;

use super::numbering::{DocumentFamily, NUMBER_WIDTH, format_number, next_number, parse_ordinal};

fn family_strategy() -> impl Strategy<Value = DocumentFamily> {
    prop_oneof![
        Just(DocumentFamily::Estimate),
        Just(DocumentFamily::Invoice),
        Just(DocumentFamily::CreditNote),
        Just(DocumentFamily::Proposal),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Allocating from any issued number yields its successor.
    #[test]
    fn prop_next_is_successor(family in family_strategy(), ordinal in 0u64..10_000_000) {
        let last = format_number(family.prefix(), ordinal);
        let next = family.next_after(Some(&last));
        prop_assert_eq!(parse_ordinal(family.prefix(), &next), Some(ordinal + 1));
    }

    /// A chain of allocations is strictly increasing.
    #[test]
    fn prop_chain_strictly_increasing(family in family_strategy(), steps in 1usize..50) {
        let mut last: Option<String> = None;
        let mut previous = 0u64;
        for _ in 0..steps {
            let next = family.next_after(last.as_deref());
            let ordinal = parse_ordinal(family.prefix(), &next).unwrap_or(0);
            prop_assert!(ordinal > previous);
            previous = ordinal;
            last = Some(next);
        }
    }

    /// Garbage never panics and always yields a well-formed number.
    #[test]
    fn prop_garbage_yields_well_formed(family in family_strategy(), garbage in ".*") {
        let next = family.next_after(Some(&garbage));
        let suffix = next.strip_prefix(family.prefix()).and_then(|s| s.strip_prefix('-'));
        prop_assert!(suffix.is_some());
        let suffix = suffix.unwrap_or_default();
        prop_assert!(suffix.len() >= NUMBER_WIDTH);
        prop_assert!(suffix.bytes().all(|b| b.is_ascii_digit()));
    }

    /// Six-digit numbers keep their padding.
    #[test]
    fn prop_padding_width(ordinal in 1u64..1_000_000) {
        let formatted = format_number("INV", ordinal);
        prop_assert_eq!(formatted.len(), "INV-".len() + NUMBER_WIDTH);
        prop_assert_eq!(next_number("INV", None), "INV-000001");
    }
}
