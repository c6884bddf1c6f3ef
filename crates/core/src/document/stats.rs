//! Per-status statistics for document lists.

use std::collections::BTreeMap;
use std::fmt::Display;

use rust_decimal::Decimal;
use serde::Serialize;

use super::status::InvoiceStatus;

/// Number of documents in each status; every known status is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Count per status string.
    pub counts: BTreeMap<String, u64>,
    /// Total number of documents.
    pub total_count: u64,
}

impl StatusCounts {
    /// Tallies `observed` statuses, reporting zero for statuses not seen.
    pub fn tally<S: Display>(all: &[S], observed: impl IntoIterator<Item = S>) -> Self {
        let mut counts: BTreeMap<String, u64> =
            all.iter().map(|s| (s.to_string(), 0)).collect();
        let mut total_count = 0;
        for status in observed {
            *counts.entry(status.to_string()).or_default() += 1;
            total_count += 1;
        }
        Self {
            counts,
            total_count,
        }
    }
}

/// Invoice statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    /// Counts per status.
    #[serde(flatten)]
    pub counts: StatusCounts,
    /// Sum of totals of paid invoices.
    pub total_paid_amount: Decimal,
    /// Sum of totals of overdue invoices.
    pub total_overdue_amount: Decimal,
    /// Sum of `total_amount - amount_paid` over invoices that are neither draft nor paid.
    pub total_outstanding_amount: Decimal,
}

/// Summarizes `(status, total_amount, amount_paid)` rows.
pub fn summarize_invoices(
    rows: impl IntoIterator<Item = (InvoiceStatus, Decimal, Decimal)>,
) -> InvoiceSummary {
    let mut statuses = Vec::new();
    let mut total_paid_amount = Decimal::ZERO;
    let mut total_overdue_amount = Decimal::ZERO;
    let mut total_outstanding_amount = Decimal::ZERO;

    for (status, total, paid) in rows {
        match status {
            InvoiceStatus::Paid => total_paid_amount += total,
            InvoiceStatus::Overdue => total_overdue_amount += total,
            _ => {}
        }
        if status.is_outstanding() {
            total_outstanding_amount += total - paid;
        }
        statuses.push(status);
    }

    InvoiceSummary {
        counts: StatusCounts::tally(InvoiceStatus::ALL, statuses),
        total_paid_amount,
        total_overdue_amount,
        total_outstanding_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::EstimateStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tally_reports_zero_for_unseen() {
        let counts = StatusCounts::tally(
            EstimateStatus::ALL,
            [EstimateStatus::Draft, EstimateStatus::Draft, EstimateStatus::Sent],
        );
        assert_eq!(counts.total_count, 3);
        assert_eq!(counts.counts["Draft"], 2);
        assert_eq!(counts.counts["Sent"], 1);
        assert_eq!(counts.counts["Invoiced"], 0);
        assert_eq!(counts.counts.len(), EstimateStatus::ALL.len());
    }

    #[test]
    fn test_summarize_invoices() {
        let summary = summarize_invoices([
            (InvoiceStatus::Paid, dec!(100), dec!(100)),
            (InvoiceStatus::PartiallyPaid, dec!(200), dec!(50)),
            (InvoiceStatus::Overdue, dec!(80), dec!(0)),
            (InvoiceStatus::Draft, dec!(999), dec!(0)),
        ]);
        assert_eq!(summary.counts.total_count, 4);
        assert_eq!(summary.counts.counts["Partially Paid"], 1);
        assert_eq!(summary.total_paid_amount, dec!(100));
        assert_eq!(summary.total_overdue_amount, dec!(80));
        assert_eq!(summary.total_outstanding_amount, dec!(230));
    }
}
