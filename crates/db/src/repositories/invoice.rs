//! Invoice repository.
//!
//! `amount_paid` and `status` are never written from request data. They are
//! derived from the invoice's payments and credit applications by
//! [`InvoiceRepository::reconcile`], which every payment and credit
//! mutation calls with the invoice row locked.

use chrono::NaiveDate;
use crmdesk_core::BillingError;
use crmdesk_core::conversion::{InvoiceDraft, due_date_or_default};
use crmdesk_core::document::{
    DocumentFamily, DocumentTotals, InvoiceStatus, InvoiceSummary, LineItem, summarize_invoices,
    validate_document,
};
use crmdesk_core::reconciliation::{InvoiceBalance, recompute_invoice_state, resolve_invoice_status};
use crmdesk_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::line_items::{ItemOwner, insert_items, load_items, replace_items};
use super::sequence::SequenceRepository;
use super::support::{ensure_contact, fetch_page, now};
use crate::entities::{
    credit_note_applications, invoices, payments, sea_orm_active_enums as db_enums,
};

/// Input for creating or updating an invoice.
#[derive(Debug, Clone)]
pub struct InvoiceInput {
    /// Billed contact.
    pub contact_id: Uuid,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date; defaults to thirty days after issue.
    pub due_date: Option<NaiveDate>,
    /// Currency code.
    pub currency: Option<String>,
    /// Requested status. Only `Draft` and `Overdue` can override the
    /// status derived from payments.
    pub status: Option<InvoiceStatus>,
    /// Sales agent.
    pub sale_agent: Option<String>,
    /// Monetary totals.
    pub totals: DocumentTotals,
    /// Terms.
    pub terms: Option<String>,
    /// Note shown to the client.
    pub client_note: Option<String>,
    /// Internal note.
    pub admin_note: Option<String>,
    /// Line items, in display order.
    pub items: Vec<LineItem>,
}

/// An invoice with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    /// Invoice row.
    #[serde(flatten)]
    pub invoice: invoices::Model,
    /// Line items in position order.
    pub items: Vec<LineItem>,
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an invoice with a freshly allocated number.
    pub async fn create(&self, input: InvoiceInput) -> Result<InvoiceDetail, BillingError> {
        validate_document(&input.totals, &input.items)?;

        let due_date = due_date_or_default(input.issue_date, input.due_date)?;
        let draft = InvoiceDraft {
            contact_id: input.contact_id,
            issue_date: input.issue_date,
            due_date,
            status: input.status.unwrap_or(InvoiceStatus::Unpaid),
            totals: input.totals,
            currency: input.currency,
            sale_agent: input.sale_agent,
            terms: input.terms,
            client_note: input.client_note,
            admin_note: input.admin_note,
            items: input.items,
        };

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        ensure_contact(&txn, draft.contact_id).await?;
        let detail = Self::insert_draft(&txn, draft).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(
            invoice_id = %detail.invoice.id,
            number = %detail.invoice.invoice_number,
            "Invoice created"
        );
        Ok(detail)
    }

    /// Inserts a planned invoice, its number and its items.
    pub(crate) async fn insert_draft<C: ConnectionTrait>(
        conn: &C,
        draft: InvoiceDraft,
    ) -> Result<InvoiceDetail, BillingError> {
        let number = SequenceRepository::allocate(conn, DocumentFamily::Invoice).await?;
        let balance = recompute_invoice_state(draft.totals.total_amount, &[], &[]);
        let status = resolve_invoice_status(Some(draft.status), &balance);

        let now = now();
        let totals = draft.totals;
        let invoice = invoices::ActiveModel {
            id: Set(Uuid::now_v7()),
            invoice_number: Set(number),
            contact_id: Set(draft.contact_id),
            issue_date: Set(draft.issue_date),
            due_date: Set(Some(draft.due_date)),
            currency: Set(draft.currency),
            status: Set(status.into()),
            sale_agent: Set(draft.sale_agent),
            sub_total: Set(totals.sub_total),
            discount_val: Set(totals.discount_val),
            discount_type: Set(totals.discount_type),
            discount_calc: Set(totals.discount_calc.into()),
            total_tax: Set(totals.total_tax),
            adjustment: Set(totals.adjustment),
            total_amount: Set(totals.total_amount),
            amount_paid: Set(balance.amount_paid),
            terms: Set(draft.terms),
            client_note: Set(draft.client_note),
            admin_note: Set(draft.admin_note),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(BillingError::store)?;

        insert_items(conn, ItemOwner::Invoice(invoice.id), &draft.items).await?;

        Ok(InvoiceDetail {
            invoice,
            items: draft.items,
        })
    }

    /// Finds an invoice with its items.
    pub async fn find(&self, id: Uuid) -> Result<InvoiceDetail, BillingError> {
        let invoice = invoices::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("invoice", id))?;
        let items = load_items(&self.db, ItemOwner::Invoice(id)).await?;
        Ok(InvoiceDetail { invoice, items })
    }

    /// Lists invoices, newest first.
    pub async fn list(
        &self,
        status: Option<InvoiceStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<invoices::Model>, BillingError> {
        let mut select = invoices::Entity::find();
        if let Some(status) = status {
            select = select.filter(invoices::Column::Status.eq(db_enums::InvoiceStatus::from(status)));
        }
        let select = select
            .order_by_desc(invoices::Column::IssueDate)
            .order_by_desc(invoices::Column::Id);
        fetch_page(&self.db, select, page).await
    }

    /// Updates an invoice and replaces its items.
    ///
    /// The paid amount is recomputed against the new total, so lowering the
    /// total below what was already paid marks the invoice `Paid`. An omitted
    /// due date falls back to the payment term, as on create. The billed
    /// contact can only change while the invoice has no payments or credits.
    pub async fn update(&self, id: Uuid, input: InvoiceInput) -> Result<InvoiceDetail, BillingError> {
        validate_document(&input.totals, &input.items)?;
        let due_date = due_date_or_default(input.issue_date, input.due_date)?;

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let existing = Self::lock(&txn, id).await?;
        if existing.contact_id != input.contact_id && Self::is_settled_against(&txn, id).await? {
            return Err(BillingError::conflict(format!(
                "invoice {id} has payments or credits; its contact cannot change"
            )));
        }
        ensure_contact(&txn, input.contact_id).await?;

        let balance = Self::balance(&txn, id, input.totals.total_amount).await?;
        let requested = input
            .status
            .unwrap_or_else(|| InvoiceStatus::from(existing.status));
        let status = resolve_invoice_status(Some(requested), &balance);

        let totals = input.totals;
        let mut active: invoices::ActiveModel = existing.into();
        active.contact_id = Set(input.contact_id);
        active.issue_date = Set(input.issue_date);
        active.due_date = Set(Some(due_date));
        active.currency = Set(input.currency);
        active.status = Set(status.into());
        active.sale_agent = Set(input.sale_agent);
        active.sub_total = Set(totals.sub_total);
        active.discount_val = Set(totals.discount_val);
        active.discount_type = Set(totals.discount_type);
        active.discount_calc = Set(totals.discount_calc.into());
        active.total_tax = Set(totals.total_tax);
        active.adjustment = Set(totals.adjustment);
        active.total_amount = Set(totals.total_amount);
        active.amount_paid = Set(balance.amount_paid);
        active.terms = Set(input.terms);
        active.client_note = Set(input.client_note);
        active.admin_note = Set(input.admin_note);
        active.updated_at = Set(now());
        let invoice = active.update(&txn).await.map_err(BillingError::store)?;

        replace_items(&txn, ItemOwner::Invoice(id), &input.items).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(invoice_id = %id, status = %status, "Invoice updated");
        Ok(InvoiceDetail {
            invoice,
            items: input.items,
        })
    }

    /// Deletes an invoice with its items and payments.
    ///
    /// Invoices that received credit cannot be deleted.
    pub async fn delete(&self, id: Uuid) -> Result<(), BillingError> {
        let txn = self.db.begin().await.map_err(BillingError::store)?;
        Self::lock(&txn, id).await?;

        let credited = credit_note_applications::Entity::find()
            .filter(credit_note_applications::Column::InvoiceId.eq(id))
            .one(&txn)
            .await
            .map_err(BillingError::store)?;
        if credited.is_some() {
            return Err(BillingError::conflict(format!(
                "invoice {id} has credit applied and cannot be deleted"
            )));
        }

        invoices::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(BillingError::store)?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(invoice_id = %id, "Invoice deleted");
        Ok(())
    }

    /// Number the next invoice would receive.
    pub async fn next_number(&self) -> Result<String, BillingError> {
        SequenceRepository::new(self.db.clone())
            .preview(DocumentFamily::Invoice)
            .await
    }

    /// Status counts and paid, overdue, and outstanding amounts.
    pub async fn stats(&self) -> Result<InvoiceSummary, BillingError> {
        let rows: Vec<(db_enums::InvoiceStatus, Decimal, Decimal)> = invoices::Entity::find()
            .select_only()
            .column(invoices::Column::Status)
            .column(invoices::Column::TotalAmount)
            .column(invoices::Column::AmountPaid)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(BillingError::store)?;

        Ok(summarize_invoices(
            rows.into_iter()
                .map(|(status, total, paid)| (status.into(), total, paid)),
        ))
    }

    /// Loads an invoice row with `SELECT ... FOR UPDATE`.
    pub(crate) async fn lock<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<invoices::Model, BillingError> {
        invoices::Entity::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("invoice", id))
    }

    /// Whether any payment or credit application references the invoice.
    async fn is_settled_against<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<bool, BillingError> {
        let paid = payments::Entity::find()
            .filter(payments::Column::InvoiceId.eq(id))
            .count(conn)
            .await
            .map_err(BillingError::store)?;
        if paid > 0 {
            return Ok(true);
        }
        let credited = credit_note_applications::Entity::find()
            .filter(credit_note_applications::Column::InvoiceId.eq(id))
            .count(conn)
            .await
            .map_err(BillingError::store)?;
        Ok(credited > 0)
    }

    /// Paid amount and derived status from every payment and credit.
    async fn balance<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        total_amount: Decimal,
    ) -> Result<InvoiceBalance, BillingError> {
        let payment_amounts: Vec<Decimal> = payments::Entity::find()
            .select_only()
            .column(payments::Column::Amount)
            .filter(payments::Column::InvoiceId.eq(id))
            .into_tuple()
            .all(conn)
            .await
            .map_err(BillingError::store)?;
        let credit_amounts: Vec<Decimal> = credit_note_applications::Entity::find()
            .select_only()
            .column(credit_note_applications::Column::Amount)
            .filter(credit_note_applications::Column::InvoiceId.eq(id))
            .into_tuple()
            .all(conn)
            .await
            .map_err(BillingError::store)?;

        Ok(recompute_invoice_state(
            total_amount,
            &payment_amounts,
            &credit_amounts,
        ))
    }

    /// Recomputes `amount_paid` and `status` of a locked invoice.
    ///
    /// `Draft` and `Overdue` survive only as [`resolve_invoice_status`] allows.
    pub(crate) async fn reconcile<C: ConnectionTrait>(
        conn: &C,
        invoice: invoices::Model,
    ) -> Result<invoices::Model, BillingError> {
        let balance = Self::balance(conn, invoice.id, invoice.total_amount).await?;
        let status = resolve_invoice_status(Some(invoice.status.into()), &balance);

        if balance.amount_paid == invoice.amount_paid && InvoiceStatus::from(invoice.status) == status
        {
            return Ok(invoice);
        }

        let id = invoice.id;
        let mut active: invoices::ActiveModel = invoice.into();
        active.amount_paid = Set(balance.amount_paid);
        active.status = Set(status.into());
        active.updated_at = Set(now());
        let invoice = active.update(conn).await.map_err(BillingError::store)?;

        info!(
            invoice_id = %id,
            amount_paid = %balance.amount_paid,
            status = %status,
            "Invoice reconciled"
        );
        Ok(invoice)
    }
}
