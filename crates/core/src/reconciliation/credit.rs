//! Credit note side of invoice reconciliation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::document::{CreditNoteStatus, validate_amount};
use crate::error::BillingError;

/// Outcome of applying credit from a note to an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditApplicationPlan {
    /// Amount to record on the application row.
    pub amount: Decimal,
    /// Note balance after the application.
    pub remaining_after: Decimal,
    /// Note status after the application.
    pub status_after: CreditNoteStatus,
}

fn status_for_remaining(remaining: Decimal) -> CreditNoteStatus {
    if remaining.is_zero() {
        CreditNoteStatus::Closed
    } else {
        CreditNoteStatus::Open
    }
}

/// Checks an application request and computes the note's new balance.
///
/// Checks run in order and nothing is written when one fails:
/// 1. `amount` must be positive, with at most two decimals and within the
///    storable range (`Validation`).
/// 2. A `Void` note cannot be applied (`Conflict`).
/// 3. `amount` must not exceed `remaining` (`InsufficientBalance`).
/// 4. `amount` must not exceed what the invoice still owes (`Validation`).
pub fn plan_credit_application(
    note_status: CreditNoteStatus,
    remaining: Decimal,
    amount: Decimal,
    invoice_outstanding: Decimal,
) -> Result<CreditApplicationPlan, BillingError> {
    if amount <= Decimal::ZERO {
        return Err(BillingError::validation("credit amount must be positive"));
    }
    validate_amount("credit amount", amount)?;
    if note_status == CreditNoteStatus::Void {
        return Err(BillingError::conflict("credit note is void"));
    }
    if amount > remaining {
        return Err(BillingError::InsufficientBalance {
            requested: amount,
            remaining,
        });
    }
    if amount > invoice_outstanding {
        return Err(BillingError::validation(format!(
            "credit amount {amount} exceeds invoice outstanding balance {invoice_outstanding}"
        )));
    }

    let remaining_after = remaining - amount;
    Ok(CreditApplicationPlan {
        amount,
        remaining_after,
        status_after: status_for_remaining(remaining_after),
    })
}

/// Recomputes a note's remaining credit after its total was edited.
///
/// The new total may not drop below what has already been applied. A note
/// with nothing left is always `Closed`; otherwise a requested `Void` is
/// kept and anything else becomes `Open`.
pub fn recompute_remaining_credits(
    total_amount: Decimal,
    applied: &[Decimal],
    requested_status: CreditNoteStatus,
) -> Result<(Decimal, CreditNoteStatus), BillingError> {
    let applied_sum: Decimal = applied.iter().copied().sum();
    if total_amount < applied_sum {
        return Err(BillingError::validation(format!(
            "total {total_amount} is below the {applied_sum} already applied"
        )));
    }

    let remaining = total_amount - applied_sum;
    let status = match (remaining.is_zero(), requested_status) {
        (true, _) => CreditNoteStatus::Closed,
        (false, CreditNoteStatus::Void) => CreditNoteStatus::Void,
        (false, _) => CreditNoteStatus::Open,
    };
    Ok((remaining, status))
}
