//! Request bodies and query strings.
//!
//! Bodies are checked with `validator` before they reach a repository; the
//! repositories still enforce the money rules, so these checks only exist to
//! give field-level messages.

use chrono::NaiveDate;
use crmdesk_core::BillingError;
use crmdesk_core::catalog::CatalogItem;
use crmdesk_core::conversion::ConversionTarget;
use crmdesk_core::document::{
    CreditNoteStatus, DiscountCalc, DocumentTotals, EstimateStatus, InvoiceStatus, LineItem,
    ProposalStatus, validate_amount, validate_qty, validate_tax_rate,
};
use crmdesk_core::recurring::Frequency;
use crmdesk_db::repositories::{
    ContactInput, CreditNoteInput, EstimateInput, ExpenseInput, InvoiceInput, PaymentInput,
    PaymentUpdate, ProposalInput,
};
use crmdesk_shared::types::PageRequest;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn rejected(code: &'static str, err: &BillingError) -> ValidationError {
    ValidationError::new(code).with_message(err.to_string().into())
}

fn money(value: &Decimal) -> Result<(), ValidationError> {
    validate_amount("value", *value).map_err(|e| rejected("money", &e))
}

fn signed_money(value: &Decimal) -> Result<(), ValidationError> {
    validate_amount("value", value.abs()).map_err(|e| rejected("money", &e))
}

fn positive_money(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("positive").with_message("must be positive".into()));
    }
    money(value)
}

fn quantity(value: &Decimal) -> Result<(), ValidationError> {
    validate_qty("value", *value).map_err(|e| rejected("qty", &e))
}

fn tax_rate(value: &Decimal) -> Result<(), ValidationError> {
    validate_tax_rate("value", *value).map_err(|e| rejected("tax", &e))
}

// ============================================================================
// Shared pieces
// ============================================================================

/// One line of a document.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LineItemRequest {
    /// Short description.
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    /// Optional long description.
    pub long_description: Option<String>,
    /// Quantity.
    #[serde(default = "one")]
    #[validate(custom(function = "quantity"))]
    pub qty: Decimal,
    /// Unit rate.
    #[validate(custom(function = "money"))]
    pub rate: Decimal,
    /// Tax percentage.
    #[serde(default)]
    #[validate(custom(function = "tax_rate"))]
    pub tax: Decimal,
    /// Line amount; computed as `qty * rate` when omitted.
    #[validate(custom(function = "money"))]
    pub amount: Option<Decimal>,
}

fn one() -> Decimal {
    Decimal::ONE
}

impl From<LineItemRequest> for LineItem {
    fn from(req: LineItemRequest) -> Self {
        let computed = Self::new(req.description, req.qty, req.rate).with_tax(req.tax);
        Self {
            long_description: req.long_description,
            amount: req.amount.unwrap_or(computed.amount),
            ..computed
        }
    }
}

/// Monetary totals of a document.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TotalsRequest {
    /// Sum of line amounts.
    #[serde(default)]
    #[validate(custom(function = "money"))]
    pub sub_total: Decimal,
    /// Discount value.
    #[serde(default)]
    #[validate(custom(function = "money"))]
    pub discount_val: Decimal,
    /// Discount kind, e.g. `percent` or `fixed`.
    pub discount_type: Option<String>,
    /// Whether the discount applies before or after tax.
    #[serde(default)]
    pub discount_calc: DiscountCalc,
    /// Total tax.
    #[serde(default)]
    #[validate(custom(function = "money"))]
    pub total_tax: Decimal,
    /// Manual adjustment; may be negative.
    #[serde(default)]
    #[validate(custom(function = "signed_money"))]
    pub adjustment: Decimal,
    /// Grand total.
    #[validate(custom(function = "money"))]
    pub total_amount: Decimal,
}

impl From<TotalsRequest> for DocumentTotals {
    fn from(req: TotalsRequest) -> Self {
        Self {
            sub_total: req.sub_total,
            discount_val: req.discount_val,
            discount_type: req.discount_type,
            discount_calc: req.discount_calc,
            total_tax: req.total_tax,
            adjustment: req.adjustment,
            total_amount: req.total_amount,
        }
    }
}

fn items(items: Vec<LineItemRequest>) -> Vec<LineItem> {
    items.into_iter().map(LineItem::from).collect()
}

/// Paging and status filter for document lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
    /// Status filter, e.g. `Partially Paid`.
    pub status: Option<String>,
}

impl ListQuery {
    /// Page request with defaults applied.
    #[must_use]
    pub fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
        .normalized()
    }
}

// ============================================================================
// Contacts
// ============================================================================

/// Request body for creating a contact.
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Email address.
    #[validate(email)]
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Default currency code.
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
}

impl From<ContactRequest> for ContactInput {
    fn from(req: ContactRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            phone: req.phone,
            company: req.company,
            address: req.address,
            city: req.city,
            country: req.country,
            currency: req.currency,
        }
    }
}

/// Request body for activating or deactivating a contact.
#[derive(Debug, Deserialize)]
pub struct ContactStatusRequest {
    /// New active flag.
    pub is_active: bool,
}

// ============================================================================
// Item catalog
// ============================================================================

/// Request body for creating, updating, or importing a catalog item.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ItemRequest {
    /// Item name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Longer description.
    pub description: Option<String>,
    /// Unit rate.
    #[serde(default)]
    #[validate(custom(function = "money"))]
    pub rate: Decimal,
    /// Unit label; `qty` when omitted.
    #[validate(length(max = 50))]
    pub unit: Option<String>,
    /// Tax percentage.
    #[serde(default)]
    #[validate(custom(function = "tax_rate"))]
    pub tax_rate: Decimal,
    /// Group; `General` when omitted.
    #[validate(length(max = 100))]
    pub group_name: Option<String>,
}

impl From<ItemRequest> for CatalogItem {
    fn from(req: ItemRequest) -> Self {
        Self::new(
            req.name,
            req.description,
            req.rate,
            req.unit,
            req.tax_rate,
            req.group_name,
        )
    }
}

/// Request body for a bulk item import.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportItemsRequest {
    /// Rows to import.
    #[validate(length(min = 1, max = 1000), nested)]
    pub items: Vec<ItemRequest>,
}

/// Query string of the item list.
#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
    /// Group filter.
    pub group: Option<String>,
}

// ============================================================================
// Documents
// ============================================================================

/// Request body for creating or updating an estimate.
#[derive(Debug, Deserialize, Validate)]
pub struct EstimateRequest {
    /// Contact the estimate is addressed to.
    pub contact_id: Uuid,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Last valid day.
    pub valid_until: Option<NaiveDate>,
    /// Customer reference.
    pub reference: Option<String>,
    /// Currency code.
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    /// Status.
    pub status: Option<EstimateStatus>,
    /// Sales agent.
    pub sale_agent: Option<String>,
    /// Totals.
    #[serde(flatten)]
    #[validate(nested)]
    pub totals: TotalsRequest,
    /// Terms.
    pub terms: Option<String>,
    /// Note shown to the client.
    pub client_note: Option<String>,
    /// Internal note.
    pub admin_note: Option<String>,
    /// Line items.
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<LineItemRequest>,
}

impl From<EstimateRequest> for EstimateInput {
    fn from(req: EstimateRequest) -> Self {
        Self {
            contact_id: req.contact_id,
            issue_date: req.issue_date,
            valid_until: req.valid_until,
            reference: req.reference,
            currency: req.currency,
            status: req.status,
            sale_agent: req.sale_agent,
            totals: req.totals.into(),
            terms: req.terms,
            client_note: req.client_note,
            admin_note: req.admin_note,
            items: items(req.items),
        }
    }
}

/// Request body for creating or updating an invoice.
#[derive(Debug, Deserialize, Validate)]
pub struct InvoiceRequest {
    /// Billed contact.
    pub contact_id: Uuid,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: Option<NaiveDate>,
    /// Currency code.
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    /// Requested status; `Draft` and `Overdue` are honoured while unpaid.
    pub status: Option<InvoiceStatus>,
    /// Sales agent.
    pub sale_agent: Option<String>,
    /// Totals.
    #[serde(flatten)]
    #[validate(nested)]
    pub totals: TotalsRequest,
    /// Terms.
    pub terms: Option<String>,
    /// Note shown to the client.
    pub client_note: Option<String>,
    /// Internal note.
    pub admin_note: Option<String>,
    /// Line items.
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<LineItemRequest>,
}

impl From<InvoiceRequest> for InvoiceInput {
    fn from(req: InvoiceRequest) -> Self {
        Self {
            contact_id: req.contact_id,
            issue_date: req.issue_date,
            due_date: req.due_date,
            currency: req.currency,
            status: req.status,
            sale_agent: req.sale_agent,
            totals: req.totals.into(),
            terms: req.terms,
            client_note: req.client_note,
            admin_note: req.admin_note,
            items: items(req.items),
        }
    }
}

/// Request body for creating or updating a credit note.
#[derive(Debug, Deserialize, Validate)]
pub struct CreditNoteRequest {
    /// Credited contact.
    pub contact_id: Uuid,
    /// Credit date.
    pub credit_date: NaiveDate,
    /// Customer reference.
    pub reference: Option<String>,
    /// Currency code.
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    /// Requested status.
    pub status: Option<CreditNoteStatus>,
    /// Totals.
    #[serde(flatten)]
    #[validate(nested)]
    pub totals: TotalsRequest,
    /// Terms.
    pub terms: Option<String>,
    /// Note shown to the client.
    pub client_note: Option<String>,
    /// Internal note.
    pub admin_note: Option<String>,
    /// Line items.
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<LineItemRequest>,
}

impl From<CreditNoteRequest> for CreditNoteInput {
    fn from(req: CreditNoteRequest) -> Self {
        Self {
            contact_id: req.contact_id,
            credit_date: req.credit_date,
            reference: req.reference,
            currency: req.currency,
            status: req.status,
            totals: req.totals.into(),
            terms: req.terms,
            client_note: req.client_note,
            admin_note: req.admin_note,
            items: items(req.items),
        }
    }
}

/// Request body for applying credit to an invoice.
#[derive(Debug, Deserialize, Validate)]
pub struct ApplyCreditRequest {
    /// Invoice receiving the credit.
    pub invoice_id: Uuid,
    /// Amount to apply.
    #[validate(custom(function = "positive_money"))]
    pub amount: Decimal,
    /// Application date; defaults to today.
    pub applied_on: Option<NaiveDate>,
}

/// Request body for creating or updating a proposal.
#[derive(Debug, Deserialize, Validate)]
pub struct ProposalRequest {
    /// Contact the proposal is addressed to.
    pub contact_id: Uuid,
    /// Subject line.
    #[validate(length(min = 1, max = 255))]
    pub subject: String,
    /// Proposal date.
    pub proposal_date: NaiveDate,
    /// Last day the proposal is open.
    pub open_till: Option<NaiveDate>,
    /// Currency code.
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    /// Status.
    pub status: Option<ProposalStatus>,
    /// Totals.
    #[serde(flatten)]
    #[validate(nested)]
    pub totals: TotalsRequest,
    /// Line items.
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<LineItemRequest>,
}

impl From<ProposalRequest> for ProposalInput {
    fn from(req: ProposalRequest) -> Self {
        Self {
            contact_id: req.contact_id,
            subject: req.subject,
            proposal_date: req.proposal_date,
            open_till: req.open_till,
            currency: req.currency,
            status: req.status,
            totals: req.totals.into(),
            items: items(req.items),
        }
    }
}

/// Request body for converting a proposal.
#[derive(Debug, Deserialize)]
pub struct ConvertProposalRequest {
    /// `invoice` or `estimate`.
    pub target: ConversionTarget,
}

// ============================================================================
// Payments
// ============================================================================

/// Request body for recording a payment.
#[derive(Debug, Deserialize, Validate)]
pub struct PaymentRequest {
    /// Invoice being paid.
    pub invoice_id: Uuid,
    /// Amount received.
    #[validate(custom(function = "positive_money"))]
    pub amount: Decimal,
    /// Payment mode.
    pub payment_mode: Option<String>,
    /// External transaction reference.
    pub transaction_id: Option<String>,
    /// Date received.
    pub payment_date: NaiveDate,
    /// Free-text note.
    pub note: Option<String>,
}

impl From<PaymentRequest> for PaymentInput {
    fn from(req: PaymentRequest) -> Self {
        Self {
            invoice_id: req.invoice_id,
            amount: req.amount,
            payment_mode: req.payment_mode,
            transaction_id: req.transaction_id,
            payment_date: req.payment_date,
            note: req.note,
        }
    }
}

/// Request body for updating a payment.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    /// Amount received.
    #[validate(custom(function = "positive_money"))]
    pub amount: Decimal,
    /// Payment mode.
    pub payment_mode: Option<String>,
    /// External transaction reference.
    pub transaction_id: Option<String>,
    /// Date received.
    pub payment_date: NaiveDate,
    /// Free-text note.
    pub note: Option<String>,
}

impl From<UpdatePaymentRequest> for PaymentUpdate {
    fn from(req: UpdatePaymentRequest) -> Self {
        Self {
            amount: req.amount,
            payment_mode: req.payment_mode,
            transaction_id: req.transaction_id,
            payment_date: req.payment_date,
            note: req.note,
        }
    }
}

/// Query string of the payment list.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentListQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
    /// Only payments of this invoice.
    pub invoice_id: Option<Uuid>,
}

// ============================================================================
// Expenses
// ============================================================================

/// Request body for creating, updating, or importing an expense.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExpenseRequest {
    /// Display name.
    #[validate(length(max = 255))]
    pub expense_name: Option<String>,
    /// Category.
    #[validate(length(max = 100))]
    pub category: Option<String>,
    /// Date incurred.
    pub entry_date: NaiveDate,
    /// Amount spent.
    #[validate(custom(function = "money"))]
    pub amount: Decimal,
    /// Currency code.
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    /// Customer the expense can be billed to.
    pub customer_id: Option<Uuid>,
    /// Reference number.
    pub reference_no: Option<String>,
    /// Payment mode.
    pub payment_mode: Option<String>,
    /// Whether the expense is billable.
    #[serde(default)]
    pub billable: bool,
    /// Free-text note.
    pub note: Option<String>,
    /// `Weekly`, `Monthly` or `Yearly` for a recurring expense.
    pub frequency: Option<Frequency>,
}

impl From<ExpenseRequest> for ExpenseInput {
    fn from(req: ExpenseRequest) -> Self {
        Self {
            expense_name: req.expense_name,
            category: req.category,
            entry_date: req.entry_date,
            amount: req.amount,
            currency: req.currency,
            customer_id: req.customer_id,
            reference_no: req.reference_no,
            payment_mode: req.payment_mode,
            billable: req.billable,
            note: req.note,
            frequency: req.frequency,
        }
    }
}

/// Request body for a bulk expense import.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportExpensesRequest {
    /// Rows to import.
    #[validate(length(min = 1, max = 1000), nested)]
    pub expenses: Vec<ExpenseRequest>,
}

/// Query string of the expense list.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
    /// Category filter.
    pub category: Option<String>,
}

/// Query string of the manual sweep trigger.
#[derive(Debug, Default, Deserialize)]
pub struct RunSweepQuery {
    /// Day to sweep; defaults to today in the scheduler timezone.
    pub date: Option<NaiveDate>,
}

/// Builds a page request from optional query values.
#[must_use]
pub fn page_of(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    ListQuery {
        page,
        per_page,
        status: None,
    }
    .page()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_line_item_amount_defaults_to_qty_times_rate() {
        let req: LineItemRequest = serde_json::from_value(json!({
            "description": "Design",
            "qty": "3",
            "rate": "33.33"
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let item = LineItem::from(req);
        assert_eq!(item.amount, dec!(99.99));
        assert_eq!(item.tax, dec!(0));
    }

    #[test]
    fn test_line_item_rejects_fractional_cents() {
        let req: LineItemRequest = serde_json::from_value(json!({
            "description": "Design",
            "rate": "10.005"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_line_item_rejects_unstorable_qty_and_tax() {
        for body in [
            json!({ "description": "Bulk", "qty": "79228162514264337593543950335", "rate": "2.00" }),
            json!({ "description": "Bulk", "qty": "1.23456", "rate": "2.00" }),
            json!({ "description": "Bulk", "rate": "2.00", "tax": "12.345" }),
            json!({ "description": "Bulk", "rate": "10000000000000.00" }),
        ] {
            let req: LineItemRequest = serde_json::from_value(body).unwrap();
            assert!(req.validate().is_err());
        }
    }

    #[test]
    fn test_totals_reject_amounts_beyond_storage() {
        let req: TotalsRequest = serde_json::from_value(json!({
            "total_amount": "100000000000000.00"
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: TotalsRequest = serde_json::from_value(json!({
            "total_amount": "10.00",
            "adjustment": "-10000000000000.00"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_item_request_fills_defaults() {
        let req: ItemRequest = serde_json::from_value(json!({
            "name": "Hosting",
            "rate": "25.00"
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let item = CatalogItem::from(req);
        assert_eq!(item.unit, "qty");
        assert_eq!(item.group_name, "General");
        assert_eq!(item.tax_rate, dec!(0));
    }

    #[test]
    fn test_item_request_rejects_bad_tax() {
        let req: ItemRequest = serde_json::from_value(json!({
            "name": "Hosting",
            "rate": "25.00",
            "tax_rate": "150"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_invoice_request_flattens_totals() {
        let req: InvoiceRequest = serde_json::from_value(json!({
            "contact_id": "0192a3b4-0000-7000-8000-000000000001",
            "issue_date": "2026-10-19",
            "status": "Partially Paid",
            "sub_total": "100.00",
            "total_amount": "110.00",
            "total_tax": "10.00",
            "items": [{ "description": "Hosting", "rate": "100.00" }]
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let input = InvoiceInput::from(req);
        assert_eq!(input.totals.total_amount, dec!(110.00));
        assert_eq!(input.status, Some(InvoiceStatus::PartiallyPaid));
        assert_eq!(input.items.len(), 1);
    }

    #[test]
    fn test_payment_amount_must_be_positive() {
        let req: PaymentRequest = serde_json::from_value(json!({
            "invoice_id": "0192a3b4-0000-7000-8000-000000000001",
            "amount": "0",
            "payment_date": "2026-10-19"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_list_query_clamps() {
        let page = ListQuery {
            page: Some(0),
            per_page: Some(1000),
            status: None,
        }
        .page();
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 100);
    }
}
