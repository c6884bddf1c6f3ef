//! Payment repository.
//!
//! Every write locks the invoice row, changes the payment set, and
//! reconciles the invoice from the full set before committing. Concurrent
//! payments against the same invoice therefore serialize and the stored
//! `amount_paid` always equals the sum of payments and credits.

use chrono::NaiveDate;
use crmdesk_core::BillingError;
use crmdesk_core::reconciliation::validate_payment_amount;
use crmdesk_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::invoice::InvoiceRepository;
use super::support::now;
use crate::entities::{invoices, payments};

/// Input for recording a payment.
#[derive(Debug, Clone)]
pub struct PaymentInput {
    /// Invoice being paid.
    pub invoice_id: Uuid,
    /// Amount received.
    pub amount: Decimal,
    /// Payment mode, e.g. `bank`.
    pub payment_mode: Option<String>,
    /// External transaction reference.
    pub transaction_id: Option<String>,
    /// Date received.
    pub payment_date: NaiveDate,
    /// Free-text note.
    pub note: Option<String>,
}

/// Changes to an existing payment.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    /// Amount received.
    pub amount: Decimal,
    /// Payment mode.
    pub payment_mode: Option<String>,
    /// External transaction reference.
    pub transaction_id: Option<String>,
    /// Date received.
    pub payment_date: NaiveDate,
    /// Free-text note.
    pub note: Option<String>,
}

/// A payment with the number of the invoice it pays.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentWithInvoice {
    /// Payment row.
    #[serde(flatten)]
    pub payment: payments::Model,
    /// Invoice number.
    pub invoice_number: Option<String>,
}

/// A payment write and the invoice state it produced.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    /// The payment after the write; `None` after a delete.
    pub payment: Option<payments::Model>,
    /// Invoice after reconciliation.
    pub invoice: invoices::Model,
}

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a payment and reconciles its invoice.
    pub async fn record(&self, input: PaymentInput) -> Result<PaymentOutcome, BillingError> {
        validate_payment_amount(input.amount)?;

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let invoice = InvoiceRepository::lock(&txn, input.invoice_id).await?;

        let now = now();
        let payment = payments::ActiveModel {
            id: Set(Uuid::now_v7()),
            invoice_id: Set(invoice.id),
            contact_id: Set(invoice.contact_id),
            amount: Set(input.amount),
            payment_mode: Set(input.payment_mode),
            transaction_id: Set(input.transaction_id),
            payment_date: Set(input.payment_date),
            note: Set(input.note),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(BillingError::store)?;

        let invoice = InvoiceRepository::reconcile(&txn, invoice).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(
            payment_id = %payment.id,
            invoice_id = %invoice.id,
            amount = %payment.amount,
            status = ?invoice.status,
            "Payment recorded"
        );
        Ok(PaymentOutcome {
            payment: Some(payment),
            invoice,
        })
    }

    /// Updates a payment and reconciles its invoice.
    pub async fn update(
        &self,
        id: Uuid,
        input: PaymentUpdate,
    ) -> Result<PaymentOutcome, BillingError> {
        validate_payment_amount(input.amount)?;

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let (invoice, payment) = Self::lock_with_invoice(&txn, id).await?;

        let mut active: payments::ActiveModel = payment.into();
        active.amount = Set(input.amount);
        active.payment_mode = Set(input.payment_mode);
        active.transaction_id = Set(input.transaction_id);
        active.payment_date = Set(input.payment_date);
        active.note = Set(input.note);
        active.updated_at = Set(now());
        let payment = active.update(&txn).await.map_err(BillingError::store)?;

        let invoice = InvoiceRepository::reconcile(&txn, invoice).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(payment_id = %id, invoice_id = %invoice.id, amount = %payment.amount, "Payment updated");
        Ok(PaymentOutcome {
            payment: Some(payment),
            invoice,
        })
    }

    /// Deletes a payment and reconciles its invoice.
    pub async fn delete(&self, id: Uuid) -> Result<PaymentOutcome, BillingError> {
        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let (invoice, _) = Self::lock_with_invoice(&txn, id).await?;

        payments::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(BillingError::store)?;

        let invoice = InvoiceRepository::reconcile(&txn, invoice).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(payment_id = %id, invoice_id = %invoice.id, "Payment deleted");
        Ok(PaymentOutcome {
            payment: None,
            invoice,
        })
    }

    /// Finds a payment with its invoice number.
    pub async fn find(&self, id: Uuid) -> Result<PaymentWithInvoice, BillingError> {
        let (payment, invoice) = payments::Entity::find_by_id(id)
            .find_also_related(invoices::Entity)
            .one(&self.db)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("payment", id))?;
        Ok(PaymentWithInvoice {
            payment,
            invoice_number: invoice.map(|i| i.invoice_number),
        })
    }

    /// Lists payments, latest first, optionally for one invoice.
    pub async fn list(
        &self,
        invoice_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<PageResponse<PaymentWithInvoice>, BillingError> {
        let page = page.normalized();
        let mut select = payments::Entity::find();
        if let Some(invoice_id) = invoice_id {
            select = select.filter(payments::Column::InvoiceId.eq(invoice_id));
        }

        let total = select
            .clone()
            .count(&self.db)
            .await
            .map_err(BillingError::store)?;
        let rows = select
            .find_also_related(invoices::Entity)
            .order_by_desc(payments::Column::PaymentDate)
            .order_by_desc(payments::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(BillingError::store)?;

        let data = rows
            .into_iter()
            .map(|(payment, invoice)| PaymentWithInvoice {
                payment,
                invoice_number: invoice.map(|i| i.invoice_number),
            })
            .collect();
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Locks the invoice of a payment, then re-reads the payment.
    async fn lock_with_invoice<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<(invoices::Model, payments::Model), BillingError> {
        let invoice_id = Self::invoice_id_of(conn, id).await?;
        let invoice = InvoiceRepository::lock(conn, invoice_id).await?;
        let payment = payments::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("payment", id))?;
        Ok((invoice, payment))
    }

    async fn invoice_id_of<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<Uuid, BillingError> {
        payments::Entity::find_by_id(id)
            .select_only()
            .column(payments::Column::InvoiceId)
            .into_tuple::<Uuid>()
            .one(conn)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("payment", id))
    }
}
