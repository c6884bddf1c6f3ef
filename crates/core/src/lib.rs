//! Billing rules for Crmdesk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Repositories in `crmdesk-db` load rows, hand them to these functions, and
//! persist whatever comes back inside a single transaction.
//!
//! # Modules
//!
//! - `catalog` - Reusable items that prefill document lines
//! - `document` - Line items, totals, statuses, and document numbering
//! - `reconciliation` - Invoice payment state and credit note application
//! - `conversion` - Estimate, proposal, and expense conversion into invoices
//! - `recurring` - Recurring expense matching and cloning
//! - `storage` - Receipt storage on top of OpenDAL

pub mod catalog;
pub mod conversion;
pub mod document;
pub mod error;
pub mod reconciliation;
pub mod recurring;
pub mod storage;

pub use error::BillingError;
