//! Invoice balance reconciliation.
//!
//! `amount_paid` is never adjusted incrementally. After any payment or
//! credit mutation the repository reloads every payment and credit
//! application for the invoice and calls [`recompute_invoice_state`].

pub mod credit;
pub mod payment;

#[cfg(test)]
mod credit_props;
#[cfg(test)]
mod payment_props;

pub use credit::{CreditApplicationPlan, plan_credit_application, recompute_remaining_credits};
pub use payment::{
    InvoiceBalance, classify_invoice_status, recompute_invoice_state, resolve_invoice_status,
    validate_payment_amount,
};
