//! `SeaORM` entity definitions.

pub mod contacts;
pub mod credit_note_applications;
pub mod credit_notes;
pub mod document_sequences;
pub mod estimates;
pub mod expenses;
pub mod invoices;
pub mod items;
pub mod line_items;
pub mod payments;
pub mod proposals;
pub mod recurring_expense_runs;
pub mod sea_orm_active_enums;
