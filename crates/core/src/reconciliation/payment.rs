//! Payment side of invoice reconciliation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::document::{InvoiceStatus, validate_amount};
use crate::error::BillingError;

/// Derived payment state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceBalance {
    /// Sum of payments and applied credits.
    pub amount_paid: Decimal,
    /// Status derived from `amount_paid` against the invoice total.
    pub status: InvoiceStatus,
}

impl InvoiceBalance {
    /// Amount still owed, never negative.
    #[must_use]
    pub fn outstanding(&self, total_amount: Decimal) -> Decimal {
        (total_amount - self.amount_paid).max(Decimal::ZERO)
    }
}

/// Classifies an invoice from what has been paid against its total.
///
/// `Paid` iff `amount_paid >= total_amount`, else `Partially Paid` iff
/// `amount_paid > 0`, else `Unpaid`. Comparisons are exact decimal
/// comparisons with no tolerance.
#[must_use]
pub fn classify_invoice_status(amount_paid: Decimal, total_amount: Decimal) -> InvoiceStatus {
    if amount_paid >= total_amount {
        InvoiceStatus::Paid
    } else if amount_paid > Decimal::ZERO {
        InvoiceStatus::PartiallyPaid
    } else {
        InvoiceStatus::Unpaid
    }
}

/// Recomputes an invoice's paid amount and status from its full payment and
/// credit history.
///
/// This is the only way `amount_paid` is derived; create, update, and delete
/// of payments and application of credits all end here.
#[must_use]
pub fn recompute_invoice_state(
    total_amount: Decimal,
    payments: &[Decimal],
    credits: &[Decimal],
) -> InvoiceBalance {
    let amount_paid: Decimal = payments.iter().chain(credits).copied().sum();
    InvoiceBalance {
        amount_paid,
        status: classify_invoice_status(amount_paid, total_amount),
    }
}

/// Status to store for an invoice whose caller asked for `requested`.
///
/// `Draft` sticks only while nothing is paid and `Overdue` only while the
/// invoice is not fully paid; otherwise the derived status wins.
#[must_use]
pub fn resolve_invoice_status(
    requested: Option<InvoiceStatus>,
    balance: &InvoiceBalance,
) -> InvoiceStatus {
    match requested {
        Some(InvoiceStatus::Draft) if balance.amount_paid.is_zero() => InvoiceStatus::Draft,
        Some(InvoiceStatus::Overdue) if balance.status != InvoiceStatus::Paid => {
            InvoiceStatus::Overdue
        }
        _ => balance.status,
    }
}

/// Validates a payment amount: strictly positive, at most two decimals, and
/// within the storable range.
pub fn validate_payment_amount(amount: Decimal) -> Result<(), BillingError> {
    if amount <= Decimal::ZERO {
        return Err(BillingError::validation("payment amount must be positive"));
    }
    validate_amount("payment amount", amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0), dec!(500), InvoiceStatus::Unpaid)]
    #[case(dec!(0.01), dec!(500), InvoiceStatus::PartiallyPaid)]
    #[case(dec!(499.99), dec!(500), InvoiceStatus::PartiallyPaid)]
    #[case(dec!(500), dec!(500), InvoiceStatus::Paid)]
    #[case(dec!(650), dec!(500), InvoiceStatus::Paid)]
    fn test_classify(
        #[case] paid: Decimal,
        #[case] total: Decimal,
        #[case] expected: InvoiceStatus,
    ) {
        assert_eq!(classify_invoice_status(paid, total), expected);
    }

    #[test]
    fn test_recompute_sums_payments_and_credits() {
        let state = recompute_invoice_state(dec!(500), &[dec!(100), dec!(150)], &[dec!(50)]);
        assert_eq!(state.amount_paid, dec!(300));
        assert_eq!(state.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(state.outstanding(dec!(500)), dec!(200));
    }

    #[test]
    fn test_deleting_only_payment_returns_to_unpaid() {
        let before = recompute_invoice_state(dec!(500), &[dec!(500)], &[]);
        assert_eq!(before.status, InvoiceStatus::Paid);

        let after = recompute_invoice_state(dec!(500), &[], &[]);
        assert_eq!(after.amount_paid, Decimal::ZERO);
        assert_eq!(after.status, InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_no_tolerance_below_total() {
        // 0.01 short of the total stays partially paid
        let state = recompute_invoice_state(dec!(100.00), &[dec!(33.33), dec!(33.33), dec!(33.33)], &[]);
        assert_eq!(state.amount_paid, dec!(99.99));
        assert_eq!(state.status, InvoiceStatus::PartiallyPaid);
    }

    #[test]
    fn test_overpayment_has_no_outstanding() {
        let state = recompute_invoice_state(dec!(100), &[dec!(120)], &[]);
        assert_eq!(state.outstanding(dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn test_requested_status_resolution() {
        let unpaid = recompute_invoice_state(dec!(100), &[], &[]);
        let partial = recompute_invoice_state(dec!(100), &[dec!(40)], &[]);
        let paid = recompute_invoice_state(dec!(100), &[dec!(100)], &[]);

        assert_eq!(resolve_invoice_status(Some(InvoiceStatus::Draft), &unpaid), InvoiceStatus::Draft);
        assert_eq!(
            resolve_invoice_status(Some(InvoiceStatus::Draft), &partial),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(
            resolve_invoice_status(Some(InvoiceStatus::Overdue), &partial),
            InvoiceStatus::Overdue
        );
        assert_eq!(resolve_invoice_status(Some(InvoiceStatus::Overdue), &paid), InvoiceStatus::Paid);
        assert_eq!(resolve_invoice_status(Some(InvoiceStatus::Paid), &unpaid), InvoiceStatus::Unpaid);
        assert_eq!(resolve_invoice_status(None, &partial), InvoiceStatus::PartiallyPaid);
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-10))]
    #[case(dec!(10.005))]
    #[case(dec!(10000000000000.00))]
    fn test_invalid_payment_amounts(#[case] amount: Decimal) {
        assert!(matches!(
            validate_payment_amount(amount),
            Err(BillingError::Validation(_))
        ));
    }
}
