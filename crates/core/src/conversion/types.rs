//! Inputs and outputs of document conversion.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{DocumentTotals, EstimateStatus, InvoiceStatus, LineItem, ProposalStatus};

/// Kind of document a proposal was converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionTarget {
    /// Converted into an invoice.
    Invoice,
    /// Converted into an estimate.
    Estimate,
}

/// Estimate as loaded for conversion.
#[derive(Debug, Clone)]
pub struct EstimateSource {
    /// Estimate ID.
    pub id: Uuid,
    /// Estimate number.
    pub number: String,
    /// Customer.
    pub contact_id: Uuid,
    /// Current status.
    pub status: EstimateStatus,
    /// Monetary totals.
    pub totals: DocumentTotals,
    /// Currency code.
    pub currency: Option<String>,
    /// Sales agent.
    pub sale_agent: Option<String>,
    /// Terms and conditions.
    pub terms: Option<String>,
    /// Note shown to the customer.
    pub client_note: Option<String>,
    /// Internal note.
    pub admin_note: Option<String>,
    /// Line items in display order.
    pub items: Vec<LineItem>,
}

/// Proposal as loaded for conversion.
#[derive(Debug, Clone)]
pub struct ProposalSource {
    /// Proposal ID.
    pub id: Uuid,
    /// Proposal number.
    pub number: String,
    /// Customer.
    pub contact_id: Uuid,
    /// Subject line.
    pub subject: String,
    /// Current status.
    pub status: ProposalStatus,
    /// Monetary totals.
    pub totals: DocumentTotals,
    /// Currency code.
    pub currency: Option<String>,
    /// What the proposal was already converted into, if anything.
    pub converted_to: Option<ConversionTarget>,
    /// Line items in display order.
    pub items: Vec<LineItem>,
}

/// Expense as loaded for conversion.
#[derive(Debug, Clone)]
pub struct ExpenseSource {
    /// Expense ID.
    pub id: Uuid,
    /// Linked customer; required for conversion.
    pub customer_id: Option<Uuid>,
    /// Invoice this expense was already billed on.
    pub invoice_id: Option<Uuid>,
    /// Display name.
    pub expense_name: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: Option<String>,
}

/// Invoice to be inserted by a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    /// Customer.
    pub contact_id: Uuid,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Initial status.
    pub status: InvoiceStatus,
    /// Monetary totals.
    pub totals: DocumentTotals,
    /// Currency code.
    pub currency: Option<String>,
    /// Sales agent.
    pub sale_agent: Option<String>,
    /// Terms and conditions.
    pub terms: Option<String>,
    /// Note shown to the customer.
    pub client_note: Option<String>,
    /// Internal note.
    pub admin_note: Option<String>,
    /// Line items in display order.
    pub items: Vec<LineItem>,
}

/// Estimate to be inserted by a proposal conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimateDraft {
    /// Customer.
    pub contact_id: Uuid,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Validity end.
    pub valid_until: NaiveDate,
    /// Initial status.
    pub status: EstimateStatus,
    /// Monetary totals.
    pub totals: DocumentTotals,
    /// Currency code.
    pub currency: Option<String>,
    /// Internal note.
    pub admin_note: Option<String>,
    /// Line items in display order.
    pub items: Vec<LineItem>,
}
