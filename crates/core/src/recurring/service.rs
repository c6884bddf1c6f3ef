//! Sweep planning for recurring expenses.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::rule::Frequency;

/// Prefix placed in front of a cloned expense's note.
pub const AUTO_RECURRING_MARKER: &str = "(Auto-Recurring)";

/// A recurring expense as loaded by the sweep.
#[derive(Debug, Clone)]
pub struct RecurringExpense {
    /// Expense ID.
    pub id: Uuid,
    /// Root of the recurrence chain: the expense's own ID if it is not a clone.
    pub root_id: Uuid,
    /// Date the expense was entered.
    pub entry_date: NaiveDate,
    /// Recurrence frequency.
    pub frequency: Frequency,
    /// Display name.
    pub expense_name: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: Option<String>,
    /// Linked customer.
    pub customer_id: Option<Uuid>,
    /// Payment mode.
    pub payment_mode: Option<String>,
    /// Reference number.
    pub reference_no: Option<String>,
    /// Whether the expense is billable to the customer.
    pub billable: bool,
    /// Free-text note.
    pub note: Option<String>,
}

/// A new expense to insert for the current period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseClone {
    /// Root of the recurrence chain; stored as the clone's source.
    pub root_id: Uuid,
    /// Expense the clone was copied from.
    pub template_id: Uuid,
    /// Dedup key for the period the clone covers.
    pub period_key: String,
    /// Entry date of the clone (the sweep date).
    pub entry_date: NaiveDate,
    /// Recurrence frequency, kept so the clone keeps recurring.
    pub frequency: Frequency,
    /// Display name.
    pub expense_name: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Amount.
    pub amount: Decimal,
    /// Currency code.
    pub currency: Option<String>,
    /// Linked customer.
    pub customer_id: Option<Uuid>,
    /// Payment mode.
    pub payment_mode: Option<String>,
    /// Reference number.
    pub reference_no: Option<String>,
    /// Whether the expense is billable.
    pub billable: bool,
    /// Note, prefixed with [`AUTO_RECURRING_MARKER`].
    pub note: String,
}

/// Recurring expense planning.
pub struct RecurringService;

impl RecurringService {
    /// Builds the note of a clone. An existing marker is not repeated.
    #[must_use]
    pub fn clone_note(note: Option<&str>) -> String {
        let body = note
            .map(str::trim)
            .map(|n| n.strip_prefix(AUTO_RECURRING_MARKER).unwrap_or(n).trim_start())
            .unwrap_or_default();
        if body.is_empty() {
            AUTO_RECURRING_MARKER.to_string()
        } else {
            format!("{AUTO_RECURRING_MARKER} {body}")
        }
    }

    /// Plans the clones due on `today`.
    ///
    /// Expenses are grouped by chain root; a chain with at least one matching
    /// member yields exactly one clone, copied from its most recent member.
    /// The caller still checks each clone's `(root_id, period_key)` against
    /// the runs already recorded before inserting.
    #[must_use]
    pub fn plan_sweep(expenses: &[RecurringExpense], today: NaiveDate) -> Vec<ExpenseClone> {
        let mut chains: BTreeMap<Uuid, &RecurringExpense> = BTreeMap::new();
        for expense in expenses
            .iter()
            .filter(|e| e.frequency.matches(e.entry_date, today))
        {
            chains
                .entry(expense.root_id)
                .and_modify(|current| {
                    if (expense.entry_date, expense.id) > (current.entry_date, current.id) {
                        *current = expense;
                    }
                })
                .or_insert(expense);
        }

        chains
            .into_values()
            .map(|template| Self::clone_for(template, today))
            .collect()
    }

    fn clone_for(template: &RecurringExpense, today: NaiveDate) -> ExpenseClone {
        ExpenseClone {
            root_id: template.root_id,
            template_id: template.id,
            period_key: template.frequency.period_key(today),
            entry_date: today,
            frequency: template.frequency,
            expense_name: template.expense_name.clone(),
            category: template.category.clone(),
            amount: template.amount,
            currency: template.currency.clone(),
            customer_id: template.customer_id,
            payment_mode: template.payment_mode.clone(),
            reference_no: template.reference_no.clone(),
            billable: template.billable,
            note: Self::clone_note(template.note.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rent(entry_date: NaiveDate) -> RecurringExpense {
        let id = Uuid::now_v7();
        RecurringExpense {
            id,
            root_id: id,
            entry_date,
            frequency: Frequency::Monthly,
            expense_name: Some("Office rent".to_string()),
            category: Some("Rent".to_string()),
            amount: dec!(1200.00),
            currency: Some("USD".to_string()),
            customer_id: None,
            payment_mode: Some("Bank".to_string()),
            reference_no: None,
            billable: false,
            note: Some("Unit 4".to_string()),
        }
    }

    #[test]
    fn test_monthly_expense_cloned_on_matching_day() {
        let expense = rent(date(2026, 1, 15));
        let clones = RecurringService::plan_sweep(&[expense.clone()], date(2026, 3, 15));

        assert_eq!(clones.len(), 1);
        let clone = &clones[0];
        assert_eq!(clone.root_id, expense.id);
        assert_eq!(clone.entry_date, date(2026, 3, 15));
        assert_eq!(clone.period_key, "2026-03");
        assert_eq!(clone.note, "(Auto-Recurring) Unit 4");
        assert_eq!(clone.amount, dec!(1200.00));
        assert_eq!(clone.payment_mode.as_deref(), Some("Bank"));
        assert_eq!(clone.frequency, Frequency::Monthly);
    }

    #[test]
    fn test_no_clone_on_other_days() {
        let expense = rent(date(2026, 1, 15));
        for day in [date(2026, 3, 14), date(2026, 3, 16), date(2026, 1, 15)] {
            assert!(RecurringService::plan_sweep(&[expense.clone()], day).is_empty());
        }
    }

    #[test]
    fn test_chain_yields_one_clone_from_latest_member() {
        let root = rent(date(2026, 1, 15));
        let mut earlier_clone = rent(date(2026, 2, 15));
        earlier_clone.root_id = root.id;
        earlier_clone.amount = dec!(1250.00);
        earlier_clone.note = Some("(Auto-Recurring) Unit 4".to_string());

        let clones = RecurringService::plan_sweep(&[root.clone(), earlier_clone.clone()], date(2026, 3, 15));

        assert_eq!(clones.len(), 1);
        assert_eq!(clones[0].root_id, root.id);
        assert_eq!(clones[0].template_id, earlier_clone.id);
        assert_eq!(clones[0].amount, dec!(1250.00));
        assert_eq!(clones[0].note, "(Auto-Recurring) Unit 4");
    }

    #[test]
    fn test_clone_note_without_body() {
        assert_eq!(RecurringService::clone_note(None), "(Auto-Recurring)");
        assert_eq!(RecurringService::clone_note(Some("  ")), "(Auto-Recurring)");
        assert_eq!(
            RecurringService::clone_note(Some("(Auto-Recurring)")),
            "(Auto-Recurring)"
        );
    }
}
