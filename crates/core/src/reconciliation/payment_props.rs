//! Property-based tests for invoice payment reconciliation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::payment::recompute_invoice_state;
use crate::document::InvoiceStatus;

fn money() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// amount_paid equals the sum and status follows the classification rule.
    #[test]
    fn prop_status_follows_sum(
        total in money(),
        payments in prop::collection::vec(money(), 0..10),
    ) {
        let sum: Decimal = payments.iter().copied().sum();
        let state = recompute_invoice_state(total, &payments, &[]);

        prop_assert_eq!(state.amount_paid, sum);
        let expected = if sum >= total {
            InvoiceStatus::Paid
        } else if sum > Decimal::ZERO {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Unpaid
        };
        prop_assert_eq!(state.status, expected);
    }

    /// Removing a payment restores the sum of the remaining ones.
    #[test]
    fn prop_delete_restores_remaining_sum(
        total in money(),
        payments in prop::collection::vec(money(), 1..10),
        index in any::<prop::sample::Index>(),
    ) {
        let mut remaining = payments.clone();
        remaining.remove(index.index(payments.len()));

        let after = recompute_invoice_state(total, &remaining, &[]);
        let expected: Decimal = remaining.iter().copied().sum();
        prop_assert_eq!(after.amount_paid, expected);
        prop_assert_eq!(after, recompute_invoice_state(total, &remaining, &[]));
    }

    /// Order of payments does not matter.
    #[test]
    fn prop_order_independent(
        total in money(),
        mut payments in prop::collection::vec(money(), 0..10),
        credits in prop::collection::vec(money(), 0..3),
    ) {
        let forward = recompute_invoice_state(total, &payments, &credits);
        payments.reverse();
        let backward = recompute_invoice_state(total, &payments, &credits);
        prop_assert_eq!(forward, backward);
    }
}
