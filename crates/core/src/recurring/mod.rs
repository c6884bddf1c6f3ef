//! Recurring expenses.
//!
//! A daily sweep looks at every expense flagged recurring and clones the ones
//! whose schedule falls on today. Clones keep recurring and point back at
//! the root of their chain, so the whole chain yields at most one new expense
//! per period.

pub mod rule;
pub mod service;

#[cfg(test)]
mod rule_props;

pub use rule::Frequency;
pub use service::{AUTO_RECURRING_MARKER, ExpenseClone, RecurringExpense, RecurringService};
