//! Conversion rules for estimates, proposals, and expenses.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use super::types::{
    ConversionTarget, EstimateDraft, EstimateSource, ExpenseSource, InvoiceDraft, ProposalSource,
};
use crate::document::{DocumentTotals, EstimateStatus, InvoiceStatus, LineItem, validate_document};
use crate::error::BillingError;

/// Days between issue and due date of a converted invoice.
pub const DEFAULT_PAYMENT_TERM_DAYS: u64 = 30;

/// Days an estimate created from a proposal stays valid.
pub const DEFAULT_VALIDITY_DAYS: u64 = 30;

/// Description used for an expense line when the expense has no name or category.
const FALLBACK_EXPENSE_DESCRIPTION: &str = "Expense";

fn days_after(date: NaiveDate, days: u64) -> Result<NaiveDate, BillingError> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| BillingError::validation(format!("date {date} is out of range")))
}

/// Due date of an invoice: the given one, or the default payment term after
/// `issue_date`.
pub fn due_date_or_default(
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
) -> Result<NaiveDate, BillingError> {
    match due_date {
        Some(date) => Ok(date),
        None => days_after(issue_date, DEFAULT_PAYMENT_TERM_DAYS),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Conversion service.
///
/// Pure planning: every check that can refuse a conversion runs here, before
/// the repository performs any write.
pub struct ConversionService;

impl ConversionService {
    /// Plans an invoice from an estimate.
    ///
    /// The invoice is `Unpaid`, issued `today`, due thirty days later, and
    /// carries the estimate's totals, notes, terms, and items unchanged.
    ///
    /// # Errors
    ///
    /// `Conflict` if the estimate was already invoiced.
    pub fn estimate_to_invoice(
        source: &EstimateSource,
        today: NaiveDate,
    ) -> Result<InvoiceDraft, BillingError> {
        if source.status.is_converted() {
            return Err(BillingError::conflict(format!(
                "estimate {} was already invoiced",
                source.number
            )));
        }
        validate_document(&source.totals, &source.items)?;

        Ok(InvoiceDraft {
            contact_id: source.contact_id,
            issue_date: today,
            due_date: days_after(today, DEFAULT_PAYMENT_TERM_DAYS)?,
            status: InvoiceStatus::Unpaid,
            totals: source.totals.clone(),
            currency: source.currency.clone(),
            sale_agent: source.sale_agent.clone(),
            terms: source.terms.clone(),
            client_note: source.client_note.clone(),
            admin_note: source.admin_note.clone(),
            items: source.items.clone(),
        })
    }

    /// Plans an invoice from a proposal.
    ///
    /// # Errors
    ///
    /// `Conflict` if the proposal was already converted into anything.
    pub fn proposal_to_invoice(
        source: &ProposalSource,
        today: NaiveDate,
    ) -> Result<InvoiceDraft, BillingError> {
        Self::ensure_proposal_unconverted(source)?;
        validate_document(&source.totals, &source.items)?;

        Ok(InvoiceDraft {
            contact_id: source.contact_id,
            issue_date: today,
            due_date: days_after(today, DEFAULT_PAYMENT_TERM_DAYS)?,
            status: InvoiceStatus::Unpaid,
            totals: source.totals.clone(),
            currency: source.currency.clone(),
            sale_agent: None,
            terms: None,
            client_note: None,
            admin_note: Some(source.subject.clone()),
            items: source.items.clone(),
        })
    }

    /// Plans an estimate from a proposal.
    ///
    /// # Errors
    ///
    /// `Conflict` if the proposal was already converted into anything.
    pub fn proposal_to_estimate(
        source: &ProposalSource,
        today: NaiveDate,
    ) -> Result<EstimateDraft, BillingError> {
        Self::ensure_proposal_unconverted(source)?;
        validate_document(&source.totals, &source.items)?;

        Ok(EstimateDraft {
            contact_id: source.contact_id,
            issue_date: today,
            valid_until: days_after(today, DEFAULT_VALIDITY_DAYS)?,
            status: EstimateStatus::Draft,
            totals: source.totals.clone(),
            currency: source.currency.clone(),
            admin_note: Some(source.subject.clone()),
            items: source.items.clone(),
        })
    }

    /// Plans an invoice billing an expense to its customer.
    ///
    /// The invoice has a single line: the expense name, else its category,
    /// else `Expense`, with quantity one at the expense amount.
    ///
    /// # Errors
    ///
    /// `Conflict` if the expense is already linked to an invoice, then
    /// `Validation` if it has no customer.
    pub fn expense_to_invoice(
        source: &ExpenseSource,
        today: NaiveDate,
    ) -> Result<InvoiceDraft, BillingError> {
        if let Some(invoice_id) = source.invoice_id {
            return Err(BillingError::conflict(format!(
                "expense {} was already converted into invoice {invoice_id}",
                source.id
            )));
        }
        let contact_id = source.customer_id.ok_or_else(|| {
            BillingError::validation(format!("expense {} has no customer linked", source.id))
        })?;

        let description = non_blank(source.expense_name.as_deref())
            .or_else(|| non_blank(source.category.as_deref()))
            .unwrap_or(FALLBACK_EXPENSE_DESCRIPTION);
        let item = LineItem {
            amount: source.amount,
            ..LineItem::new(description, Decimal::ONE, source.amount)
        };

        let totals = DocumentTotals::flat(source.amount);
        let items = vec![item];
        validate_document(&totals, &items)?;

        Ok(InvoiceDraft {
            contact_id,
            issue_date: today,
            due_date: days_after(today, DEFAULT_PAYMENT_TERM_DAYS)?,
            status: InvoiceStatus::Unpaid,
            totals,
            currency: source.currency.clone(),
            sale_agent: None,
            terms: None,
            client_note: None,
            admin_note: None,
            items,
        })
    }

    fn ensure_proposal_unconverted(source: &ProposalSource) -> Result<(), BillingError> {
        match source.converted_to {
            Some(ConversionTarget::Invoice) => Err(BillingError::conflict(format!(
                "proposal {} was already converted into an invoice",
                source.number
            ))),
            Some(ConversionTarget::Estimate) => Err(BillingError::conflict(format!(
                "proposal {} was already converted into an estimate",
                source.number
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ProposalStatus;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_due_date_defaults_to_payment_term() {
        assert_eq!(
            due_date_or_default(today(), None).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 18).unwrap()
        );
        let explicit = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        assert_eq!(due_date_or_default(today(), Some(explicit)).unwrap(), explicit);
        assert!(due_date_or_default(NaiveDate::MAX, None).is_err());
    }

    fn estimate() -> EstimateSource {
        EstimateSource {
            id: Uuid::now_v7(),
            number: "EST-000007".to_string(),
            contact_id: Uuid::now_v7(),
            status: EstimateStatus::Accepted,
            totals: DocumentTotals {
                sub_total: dec!(500),
                total_amount: dec!(500),
                ..DocumentTotals::default()
            },
            currency: Some("USD".to_string()),
            sale_agent: Some("Dana".to_string()),
            terms: Some("Net 30".to_string()),
            client_note: Some("Thanks".to_string()),
            admin_note: None,
            items: vec![
                LineItem::new("Design", dec!(2), dec!(150)),
                LineItem::new("Build", dec!(1), dec!(200)).with_long_description("Phase one"),
            ],
        }
    }

    fn proposal() -> ProposalSource {
        ProposalSource {
            id: Uuid::now_v7(),
            number: "PRO-000003".to_string(),
            contact_id: Uuid::now_v7(),
            subject: "Website redesign".to_string(),
            status: ProposalStatus::Open,
            totals: DocumentTotals::flat(dec!(1200)),
            currency: None,
            converted_to: None,
            items: vec![LineItem::new("Redesign", dec!(1), dec!(1200))],
        }
    }

    fn expense() -> ExpenseSource {
        ExpenseSource {
            id: Uuid::now_v7(),
            customer_id: Some(Uuid::now_v7()),
            invoice_id: None,
            expense_name: Some("Travel".to_string()),
            category: Some("Transport".to_string()),
            amount: dec!(84.20),
            currency: None,
        }
    }

    #[test]
    fn test_estimate_to_invoice_copies_totals_and_items() {
        let source = estimate();
        let draft = ConversionService::estimate_to_invoice(&source, today()).unwrap();

        assert_eq!(draft.totals.total_amount, dec!(500));
        assert_eq!(draft.items, source.items);
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.status, InvoiceStatus::Unpaid);
        assert_eq!(draft.issue_date, today());
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2026, 11, 18).unwrap());
        assert_eq!(draft.terms.as_deref(), Some("Net 30"));
        assert_eq!(draft.contact_id, source.contact_id);
    }

    #[test]
    fn test_invoiced_estimate_is_conflict() {
        let mut source = estimate();
        source.status = EstimateStatus::Invoiced;
        let err = ConversionService::estimate_to_invoice(&source, today()).unwrap_err();
        assert!(matches!(err, BillingError::Conflict(_)));
    }

    #[test]
    fn test_proposal_to_estimate_defaults() {
        let draft = ConversionService::proposal_to_estimate(&proposal(), today()).unwrap();
        assert_eq!(draft.status, EstimateStatus::Draft);
        assert_eq!(draft.valid_until, NaiveDate::from_ymd_opt(2026, 11, 18).unwrap());
        assert_eq!(draft.admin_note.as_deref(), Some("Website redesign"));
    }

    #[test]
    fn test_converted_proposal_is_conflict_for_both_targets() {
        let mut source = proposal();
        source.converted_to = Some(ConversionTarget::Estimate);
        assert!(matches!(
            ConversionService::proposal_to_invoice(&source, today()),
            Err(BillingError::Conflict(_))
        ));
        assert!(matches!(
            ConversionService::proposal_to_estimate(&source, today()),
            Err(BillingError::Conflict(_))
        ));
    }

    #[test]
    fn test_expense_to_invoice_single_line() {
        let source = expense();
        let draft = ConversionService::expense_to_invoice(&source, today()).unwrap();

        assert_eq!(draft.contact_id, source.customer_id.unwrap());
        assert_eq!(draft.totals.total_amount, dec!(84.20));
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].description, "Travel");
        assert_eq!(draft.items[0].qty, dec!(1));
        assert_eq!(draft.items[0].rate, dec!(84.20));
        assert_eq!(draft.items[0].amount, dec!(84.20));
    }

    #[test]
    fn test_expense_description_fallbacks() {
        let mut source = expense();
        source.expense_name = Some("   ".to_string());
        let draft = ConversionService::expense_to_invoice(&source, today()).unwrap();
        assert_eq!(draft.items[0].description, "Transport");

        source.category = None;
        let draft = ConversionService::expense_to_invoice(&source, today()).unwrap();
        assert_eq!(draft.items[0].description, "Expense");
    }

    #[test]
    fn test_converted_expense_is_conflict() {
        let mut source = expense();
        source.invoice_id = Some(Uuid::now_v7());
        let err = ConversionService::expense_to_invoice(&source, today()).unwrap_err();
        assert!(matches!(err, BillingError::Conflict(_)));
    }

    #[test]
    fn test_expense_without_customer_is_validation() {
        let mut source = expense();
        source.customer_id = None;
        let err = ConversionService::expense_to_invoice(&source, today()).unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }
}
