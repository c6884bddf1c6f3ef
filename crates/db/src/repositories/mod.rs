//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Every multi-step write runs in one transaction; dropping it on an error
//! rolls the whole operation back.

pub mod contact;
pub mod credit_note;
pub mod estimate;
pub mod expense;
pub mod invoice;
pub mod item;
pub mod line_items;
pub mod payment;
pub mod proposal;
pub mod recurring;
pub mod sequence;
mod support;

pub use contact::{ContactInput, ContactRepository};
pub use credit_note::{CreditApplication, CreditNoteDetail, CreditNoteInput, CreditNoteRepository};
pub use estimate::{EstimateDetail, EstimateInput, EstimateRepository};
pub use expense::{ExpenseInput, ExpenseRepository};
pub use invoice::{InvoiceDetail, InvoiceInput, InvoiceRepository};
pub use item::ItemRepository;
pub use line_items::ItemOwner;
pub use payment::{
    PaymentInput, PaymentOutcome, PaymentRepository, PaymentUpdate, PaymentWithInvoice,
};
pub use proposal::{ProposalConversion, ProposalDetail, ProposalInput, ProposalRepository};
pub use recurring::{RecurringRepository, SweepReport};
pub use sequence::SequenceRepository;
