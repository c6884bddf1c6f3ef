//! Document conversion planning.
//!
//! Converting reads a source document, refuses sources that were already
//! consumed, and produces a draft of the target document with totals and
//! line items copied verbatim. The repository allocates the target number,
//! inserts the draft, and marks the source inside one transaction.

pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::{
    ConversionService, DEFAULT_PAYMENT_TERM_DAYS, DEFAULT_VALIDITY_DAYS, due_date_or_default,
};
pub use types::{
    ConversionTarget, EstimateDraft, EstimateSource, ExpenseSource, InvoiceDraft, ProposalSource,
};
