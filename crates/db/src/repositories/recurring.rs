//! Recurring expense sweep.
//!
//! Each planned clone is inserted in its own transaction together with a
//! `recurring_expense_runs` row keyed by chain root and period. A second
//! sweep for the same period finds that key taken, inserts nothing and
//! rolls its clone back, so a chain yields at most one expense per period
//! however often the sweep runs.

use chrono::NaiveDate;
use crmdesk_core::BillingError;
use crmdesk_core::recurring::{ExpenseClone, RecurringExpense, RecurringService};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait, sea_query::OnConflict,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::support::now;
use crate::entities::{expenses, recurring_expense_runs};

/// Summary of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Date the sweep ran for.
    pub run_date: Option<NaiveDate>,
    /// Recurring expenses examined.
    pub considered: usize,
    /// Chains due today.
    pub due: usize,
    /// Clones inserted.
    pub created: usize,
    /// Chains already cloned for this period.
    pub skipped: usize,
    /// Chains whose clone failed.
    pub failed: usize,
}

/// Outcome of inserting one clone.
enum CloneOutcome {
    Created(Uuid),
    AlreadyRan,
}

/// Recurring expense repository.
#[derive(Debug, Clone)]
pub struct RecurringRepository {
    db: DatabaseConnection,
}

impl RecurringRepository {
    /// Creates a new recurring expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Clones every recurring expense chain due on `today`.
    ///
    /// A failing clone is logged and counted; the sweep moves on to the
    /// next chain.
    pub async fn run_sweep(&self, today: NaiveDate) -> Result<SweepReport, BillingError> {
        let rows = expenses::Entity::find()
            .filter(expenses::Column::IsRecurring.eq(true))
            .filter(expenses::Column::Frequency.is_not_null())
            .all(&self.db)
            .await
            .map_err(BillingError::store)?;

        let candidates: Vec<RecurringExpense> = rows
            .into_iter()
            .filter_map(|row| {
                let frequency = row.frequency?.into();
                Some(RecurringExpense {
                    id: row.id,
                    root_id: row.recurrence_root(),
                    entry_date: row.entry_date,
                    frequency,
                    expense_name: row.expense_name,
                    category: row.category,
                    amount: row.amount,
                    currency: row.currency,
                    customer_id: row.customer_id,
                    payment_mode: row.payment_mode,
                    reference_no: row.reference_no,
                    billable: row.billable,
                    note: row.note,
                })
            })
            .collect();

        let plan = RecurringService::plan_sweep(&candidates, today);
        let mut report = SweepReport {
            run_date: Some(today),
            considered: candidates.len(),
            due: plan.len(),
            ..SweepReport::default()
        };

        for clone in plan {
            match self.insert_clone(&clone).await {
                Ok(CloneOutcome::Created(expense_id)) => {
                    report.created += 1;
                    info!(
                        root_id = %clone.root_id,
                        expense_id = %expense_id,
                        period = %clone.period_key,
                        "Recurring expense cloned"
                    );
                }
                Ok(CloneOutcome::AlreadyRan) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        root_id = %clone.root_id,
                        period = %clone.period_key,
                        error = %e,
                        "Recurring expense clone failed"
                    );
                }
            }
        }

        info!(
            date = %today,
            considered = report.considered,
            due = report.due,
            created = report.created,
            skipped = report.skipped,
            failed = report.failed,
            "Recurring expense sweep finished"
        );
        Ok(report)
    }

    async fn insert_clone(&self, clone: &ExpenseClone) -> Result<CloneOutcome, BillingError> {
        let txn = self.db.begin().await.map_err(BillingError::store)?;

        let now = now();
        let expense = expenses::ActiveModel {
            id: Set(Uuid::now_v7()),
            expense_name: Set(clone.expense_name.clone()),
            category: Set(clone.category.clone()),
            entry_date: Set(clone.entry_date),
            amount: Set(clone.amount),
            currency: Set(clone.currency.clone()),
            customer_id: Set(clone.customer_id),
            invoice_id: Set(None),
            reference_no: Set(clone.reference_no.clone()),
            payment_mode: Set(clone.payment_mode.clone()),
            billable: Set(clone.billable),
            note: Set(Some(clone.note.clone())),
            receipt_path: Set(None),
            is_recurring: Set(true),
            frequency: Set(Some(clone.frequency.into())),
            recurring_source_id: Set(Some(clone.root_id)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(BillingError::store)?;

        let run = recurring_expense_runs::ActiveModel {
            root_expense_id: Set(clone.root_id),
            period_key: Set(clone.period_key.clone()),
            expense_id: Set(Some(expense.id)),
            run_date: Set(clone.entry_date),
            created_at: Set(now),
        };
        let inserted = recurring_expense_runs::Entity::insert(run)
            .on_conflict(
                OnConflict::columns([
                    recurring_expense_runs::Column::RootExpenseId,
                    recurring_expense_runs::Column::PeriodKey,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(BillingError::store)?;

        if inserted == 0 {
            txn.rollback().await.map_err(BillingError::store)?;
            return Ok(CloneOutcome::AlreadyRan);
        }

        txn.commit().await.map_err(BillingError::store)?;
        Ok(CloneOutcome::Created(expense.id))
    }
}
