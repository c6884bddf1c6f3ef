//! Property-based tests for credit note application.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::credit::plan_credit_application;
use crate::document::CreditNoteStatus;
use crate::error::BillingError;

fn money() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Remaining credit never goes negative and zero always means Closed.
    #[test]
    fn prop_remaining_never_negative(
        total in money(),
        amounts in prop::collection::vec(money(), 1..20),
    ) {
        let mut remaining = total;
        let mut status = CreditNoteStatus::Open;
        for amount in amounts {
            match plan_credit_application(status, remaining, amount, Decimal::MAX) {
                Ok(plan) => {
                    prop_assert!(plan.remaining_after >= Decimal::ZERO);
                    prop_assert_eq!(plan.remaining_after, remaining - amount);
                    prop_assert_eq!(
                        plan.remaining_after.is_zero(),
                        plan.status_after == CreditNoteStatus::Closed
                    );
                    remaining = plan.remaining_after;
                    status = plan.status_after;
                }
                Err(BillingError::InsufficientBalance { requested, remaining: left }) => {
                    prop_assert!(requested > left);
                    prop_assert_eq!(left, remaining);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }
    }

    /// Applications never exceed the invoice's outstanding balance.
    #[test]
    fn prop_respects_outstanding(
        remaining in money(),
        amount in money(),
        outstanding in money(),
    ) {
        let result = plan_credit_application(CreditNoteStatus::Open, remaining, amount, outstanding);
        if amount <= remaining && amount <= outstanding {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.is_err());
        }
    }
}
