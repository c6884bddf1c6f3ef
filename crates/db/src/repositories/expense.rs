//! Expense repository.

use chrono::NaiveDate;
use crmdesk_core::BillingError;
use crmdesk_core::conversion::{ConversionService, ExpenseSource};
use crmdesk_core::document::validate_amount;
use crmdesk_core::recurring::Frequency;
use crmdesk_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::invoice::{InvoiceDetail, InvoiceRepository};
use super::support::{ensure_contact, fetch_page, now};
use crate::entities::expenses;

/// Input for creating, updating, or importing an expense.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    /// Display name.
    pub expense_name: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Date the expense was incurred.
    pub entry_date: NaiveDate,
    /// Amount spent.
    pub amount: Decimal,
    /// Currency code.
    pub currency: Option<String>,
    /// Customer the expense can be billed to.
    pub customer_id: Option<Uuid>,
    /// Reference number.
    pub reference_no: Option<String>,
    /// Payment mode.
    pub payment_mode: Option<String>,
    /// Whether the expense is billable.
    pub billable: bool,
    /// Free-text note.
    pub note: Option<String>,
    /// Recurrence; `None` for a one-off expense.
    pub frequency: Option<Frequency>,
}

impl ExpenseInput {
    fn validate(&self) -> Result<(), BillingError> {
        validate_amount("expense amount", self.amount)
    }
}

/// Expense repository.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an expense.
    pub async fn create(&self, input: ExpenseInput) -> Result<expenses::Model, BillingError> {
        input.validate()?;
        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let expense = Self::insert(&txn, input).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(expense_id = %expense.id, recurring = expense.is_recurring, "Expense created");
        Ok(expense)
    }

    /// Imports a batch of expenses; either all are stored or none.
    pub async fn import(
        &self,
        inputs: Vec<ExpenseInput>,
    ) -> Result<Vec<expenses::Model>, BillingError> {
        for (idx, input) in inputs.iter().enumerate() {
            input
                .validate()
                .map_err(|e| BillingError::validation(format!("row {}: {e}", idx + 1)))?;
        }

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let mut imported = Vec::with_capacity(inputs.len());
        for input in inputs {
            imported.push(Self::insert(&txn, input).await?);
        }
        txn.commit().await.map_err(BillingError::store)?;

        info!(count = imported.len(), "Expenses imported");
        Ok(imported)
    }

    async fn insert<C: ConnectionTrait>(
        conn: &C,
        input: ExpenseInput,
    ) -> Result<expenses::Model, BillingError> {
        if let Some(customer_id) = input.customer_id {
            ensure_contact(conn, customer_id).await?;
        }

        let now = now();
        expenses::ActiveModel {
            id: Set(Uuid::now_v7()),
            expense_name: Set(input.expense_name),
            category: Set(input.category),
            entry_date: Set(input.entry_date),
            amount: Set(input.amount),
            currency: Set(input.currency),
            customer_id: Set(input.customer_id),
            invoice_id: Set(None),
            reference_no: Set(input.reference_no),
            payment_mode: Set(input.payment_mode),
            billable: Set(input.billable),
            note: Set(input.note),
            receipt_path: Set(None),
            is_recurring: Set(input.frequency.is_some()),
            frequency: Set(input.frequency.map(Into::into)),
            recurring_source_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(BillingError::store)
    }

    /// Finds an expense by ID.
    pub async fn find(&self, id: Uuid) -> Result<expenses::Model, BillingError> {
        expenses::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("expense", id))
    }

    /// Lists expenses, latest first, optionally by category.
    pub async fn list(
        &self,
        category: Option<&str>,
        page: &PageRequest,
    ) -> Result<PageResponse<expenses::Model>, BillingError> {
        let mut select = expenses::Entity::find();
        if let Some(category) = category {
            select = select.filter(expenses::Column::Category.eq(category));
        }
        let select = select
            .order_by_desc(expenses::Column::EntryDate)
            .order_by_desc(expenses::Column::Id);
        fetch_page(&self.db, select, page).await
    }

    /// Updates an expense. The invoice link and receipt are kept.
    pub async fn update(
        &self,
        id: Uuid,
        input: ExpenseInput,
    ) -> Result<expenses::Model, BillingError> {
        input.validate()?;

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let existing = Self::lock(&txn, id).await?;
        if let Some(customer_id) = input.customer_id {
            ensure_contact(&txn, customer_id).await?;
        }

        let mut active: expenses::ActiveModel = existing.into();
        active.expense_name = Set(input.expense_name);
        active.category = Set(input.category);
        active.entry_date = Set(input.entry_date);
        active.amount = Set(input.amount);
        active.currency = Set(input.currency);
        active.customer_id = Set(input.customer_id);
        active.reference_no = Set(input.reference_no);
        active.payment_mode = Set(input.payment_mode);
        active.billable = Set(input.billable);
        active.note = Set(input.note);
        active.is_recurring = Set(input.frequency.is_some());
        active.frequency = Set(input.frequency.map(Into::into));
        active.updated_at = Set(now());
        let expense = active.update(&txn).await.map_err(BillingError::store)?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(expense_id = %id, "Expense updated");
        Ok(expense)
    }

    /// Deletes an expense, returning the deleted row so its receipt can be removed.
    pub async fn delete(&self, id: Uuid) -> Result<expenses::Model, BillingError> {
        let expense = self.find(id).await?;
        expenses::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(BillingError::store)?;
        info!(expense_id = %id, "Expense deleted");
        Ok(expense)
    }

    /// Points an expense at a stored receipt.
    pub async fn set_receipt(
        &self,
        id: Uuid,
        receipt_path: String,
    ) -> Result<expenses::Model, BillingError> {
        let existing = self.find(id).await?;
        let mut active: expenses::ActiveModel = existing.into();
        active.receipt_path = Set(Some(receipt_path));
        active.updated_at = Set(now());
        active.update(&self.db).await.map_err(BillingError::store)
    }

    /// Bills an expense to its customer as a new invoice.
    ///
    /// # Errors
    ///
    /// `Conflict` if the expense is already invoiced, `Validation` if it has
    /// no customer.
    pub async fn convert_to_invoice(
        &self,
        id: Uuid,
        today: NaiveDate,
    ) -> Result<InvoiceDetail, BillingError> {
        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let expense = Self::lock(&txn, id).await?;

        let source = ExpenseSource {
            id: expense.id,
            customer_id: expense.customer_id,
            invoice_id: expense.invoice_id,
            expense_name: expense.expense_name.clone(),
            category: expense.category.clone(),
            amount: expense.amount,
            currency: expense.currency.clone(),
        };
        let draft = ConversionService::expense_to_invoice(&source, today)?;
        let invoice = InvoiceRepository::insert_draft(&txn, draft).await?;

        let mut active: expenses::ActiveModel = expense.into();
        active.invoice_id = Set(Some(invoice.invoice.id));
        active.updated_at = Set(now());
        active.update(&txn).await.map_err(BillingError::store)?;

        txn.commit().await.map_err(BillingError::store)?;

        info!(
            expense_id = %id,
            invoice_id = %invoice.invoice.id,
            number = %invoice.invoice.invoice_number,
            "Expense converted to invoice"
        );
        Ok(invoice)
    }

    async fn lock<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<expenses::Model, BillingError> {
        expenses::Entity::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("expense", id))
    }
}
