//! Financial documents: line items, totals, statuses, and numbering.
//!
//! Estimates, invoices, credit notes, and proposals share one shape: a parent
//! row with monetary totals and an ordered list of line items that is always
//! replaced as a whole.

pub mod numbering;
pub mod stats;
pub mod status;
pub mod types;
pub mod validation;

#[cfg(test)]
mod numbering_props;

pub use numbering::{DocumentFamily, NUMBER_WIDTH, format_number, next_number, parse_ordinal};
pub use stats::{InvoiceSummary, StatusCounts, summarize_invoices};
pub use status::{CreditNoteStatus, EstimateStatus, InvoiceStatus, ProposalStatus};
pub use types::{DiscountCalc, DocumentTotals, LineItem};
pub use validation::{
    MAX_MONEY, MAX_QTY, validate_amount, validate_document, validate_line_items, validate_qty,
    validate_tax_rate, validate_totals,
};
