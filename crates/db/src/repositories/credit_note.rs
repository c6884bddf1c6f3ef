//! Credit note repository.
//!
//! Applying credit locks the credit note first and the invoice second.
//! Payment writes only lock the invoice, so the two paths cannot deadlock.

use chrono::NaiveDate;
use crmdesk_core::BillingError;
use crmdesk_core::document::{
    CreditNoteStatus, DocumentFamily, DocumentTotals, LineItem, StatusCounts, validate_document,
};
use crmdesk_core::reconciliation::{plan_credit_application, recompute_remaining_credits};
use crmdesk_shared::types::{PageRequest, PageResponse};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::invoice::InvoiceRepository;
use super::line_items::{ItemOwner, insert_items, load_items, replace_items};
use super::sequence::SequenceRepository;
use super::support::{ensure_contact, fetch_page, now};
use crate::entities::{
    credit_note_applications, credit_notes, invoices, sea_orm_active_enums as db_enums,
};

/// Input for creating or updating a credit note.
#[derive(Debug, Clone)]
pub struct CreditNoteInput {
    /// Credited contact.
    pub contact_id: Uuid,
    /// Credit date.
    pub credit_date: NaiveDate,
    /// Customer reference.
    pub reference: Option<String>,
    /// Currency code.
    pub currency: Option<String>,
    /// Requested status. Only `Void` is honoured while credit remains.
    pub status: Option<CreditNoteStatus>,
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

/// A credit note with its items and applications.
#[derive(Debug, Clone, Serialize)]
pub struct CreditNoteDetail {
    /// Credit note row.
    #[serde(flatten)]
    pub credit_note: credit_notes::Model,
    /// Line items in position order.
    pub items: Vec<LineItem>,
    /// Applications against invoices, oldest first.
    pub applications: Vec<credit_note_applications::Model>,
}

/// Outcome of applying credit to an invoice.
#[derive(Debug, Clone, Serialize)]
pub struct CreditApplication {
    /// The recorded application.
    pub application: credit_note_applications::Model,
    /// Credit note after the application.
    pub credit_note: credit_notes::Model,
    /// Invoice after reconciliation.
    pub invoice: invoices::Model,
}

/// Credit note repository.
#[derive(Debug, Clone)]
pub struct CreditNoteRepository {
    db: DatabaseConnection,
}

impl CreditNoteRepository {
    /// Creates a new credit note repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a credit note whose remaining credit equals its total.
    pub async fn create(&self, input: CreditNoteInput) -> Result<CreditNoteDetail, BillingError> {
        validate_document(&input.totals, &input.items)?;
        let (remaining, status) = recompute_remaining_credits(
            input.totals.total_amount,
            &[],
            input.status.unwrap_or(CreditNoteStatus::Open),
        )?;

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        ensure_contact(&txn, input.contact_id).await?;
        let number = SequenceRepository::allocate(&txn, DocumentFamily::CreditNote).await?;

        let now = now();
        let totals = input.totals;
        let credit_note = credit_notes::ActiveModel {
            id: Set(Uuid::now_v7()),
            credit_note_number: Set(number),
            contact_id: Set(input.contact_id),
            credit_date: Set(input.credit_date),
            reference: Set(input.reference),
            currency: Set(input.currency),
            status: Set(status.into()),
            sub_total: Set(totals.sub_total),
            discount_val: Set(totals.discount_val),
            discount_type: Set(totals.discount_type),
            discount_calc: Set(totals.discount_calc.into()),
            total_tax: Set(totals.total_tax),
            adjustment: Set(totals.adjustment),
            total_amount: Set(totals.total_amount),
            remaining_credits: Set(remaining),
            terms: Set(input.terms),
            client_note: Set(input.client_note),
            admin_note: Set(input.admin_note),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(BillingError::store)?;

        insert_items(&txn, ItemOwner::CreditNote(credit_note.id), &input.items).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(
            credit_note_id = %credit_note.id,
            number = %credit_note.credit_note_number,
            remaining = %remaining,
            "Credit note created"
        );
        Ok(CreditNoteDetail {
            credit_note,
            items: input.items,
            applications: Vec::new(),
        })
    }

    /// Finds a credit note with its items and applications.
    pub async fn find(&self, id: Uuid) -> Result<CreditNoteDetail, BillingError> {
        let credit_note = credit_notes::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("credit note", id))?;
        let items = load_items(&self.db, ItemOwner::CreditNote(id)).await?;
        let applications = Self::applications(&self.db, id).await?;
        Ok(CreditNoteDetail {
            credit_note,
            items,
            applications,
        })
    }

    /// Lists credit notes, newest first.
    pub async fn list(
        &self,
        status: Option<CreditNoteStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<credit_notes::Model>, BillingError> {
        let mut select = credit_notes::Entity::find();
        if let Some(status) = status {
            select = select
                .filter(credit_notes::Column::Status.eq(db_enums::CreditNoteStatus::from(status)));
        }
        let select = select
            .order_by_desc(credit_notes::Column::CreditDate)
            .order_by_desc(credit_notes::Column::Id);
        fetch_page(&self.db, select, page).await
    }

    /// Updates a credit note and replaces its items.
    ///
    /// Remaining credit becomes the new total minus everything already
    /// applied.
    ///
    /// # Errors
    ///
    /// `Validation` if the new total is below the applied amount.
    pub async fn update(
        &self,
        id: Uuid,
        input: CreditNoteInput,
    ) -> Result<CreditNoteDetail, BillingError> {
        validate_document(&input.totals, &input.items)?;

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let existing = Self::lock(&txn, id).await?;
        ensure_contact(&txn, input.contact_id).await?;

        let applications = Self::applications(&txn, id).await?;
        let applied: Vec<Decimal> = applications.iter().map(|a| a.amount).collect();
        let requested = input
            .status
            .unwrap_or_else(|| CreditNoteStatus::from(existing.status));
        let (remaining, status) =
            recompute_remaining_credits(input.totals.total_amount, &applied, requested)?;

        let totals = input.totals;
        let mut active: credit_notes::ActiveModel = existing.into();
        active.contact_id = Set(input.contact_id);
        active.credit_date = Set(input.credit_date);
        active.reference = Set(input.reference);
        active.currency = Set(input.currency);
        active.status = Set(status.into());
        active.sub_total = Set(totals.sub_total);
        active.discount_val = Set(totals.discount_val);
        active.discount_type = Set(totals.discount_type);
        active.discount_calc = Set(totals.discount_calc.into());
        active.total_tax = Set(totals.total_tax);
        active.adjustment = Set(totals.adjustment);
        active.total_amount = Set(totals.total_amount);
        active.remaining_credits = Set(remaining);
        active.terms = Set(input.terms);
        active.client_note = Set(input.client_note);
        active.admin_note = Set(input.admin_note);
        active.updated_at = Set(now());
        let credit_note = active.update(&txn).await.map_err(BillingError::store)?;

        replace_items(&txn, ItemOwner::CreditNote(id), &input.items).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(credit_note_id = %id, remaining = %remaining, status = %status, "Credit note updated");
        Ok(CreditNoteDetail {
            credit_note,
            items: input.items,
            applications,
        })
    }

    /// Deletes a credit note that was never applied.
    pub async fn delete(&self, id: Uuid) -> Result<(), BillingError> {
        let txn = self.db.begin().await.map_err(BillingError::store)?;
        Self::lock(&txn, id).await?;

        if !Self::applications(&txn, id).await?.is_empty() {
            return Err(BillingError::conflict(format!(
                "credit note {id} was applied to invoices and cannot be deleted"
            )));
        }

        credit_notes::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(BillingError::store)?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(credit_note_id = %id, "Credit note deleted");
        Ok(())
    }

    /// Number the next credit note would receive.
    pub async fn next_number(&self) -> Result<String, BillingError> {
        SequenceRepository::new(self.db.clone())
            .preview(DocumentFamily::CreditNote)
            .await
    }

    /// Credit note count per status.
    pub async fn stats(&self) -> Result<StatusCounts, BillingError> {
        let statuses: Vec<db_enums::CreditNoteStatus> = credit_notes::Entity::find()
            .select_only()
            .column(credit_notes::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(BillingError::store)?;
        Ok(StatusCounts::tally(
            CreditNoteStatus::ALL,
            statuses.into_iter().map(CreditNoteStatus::from),
        ))
    }

    /// Applies `amount` of a credit note to an invoice.
    ///
    /// The note's remaining credit drops by `amount` (closing the note at
    /// zero) and the invoice is reconciled with the credit counted as paid.
    /// Nothing is written when a check fails.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the note or the invoice is missing.
    /// - `Validation` for a non-positive amount or one above what the invoice owes.
    /// - `Conflict` for a void note.
    /// - `InsufficientBalance` when `amount` exceeds the remaining credit.
    pub async fn apply(
        &self,
        credit_note_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
        applied_on: NaiveDate,
    ) -> Result<CreditApplication, BillingError> {
        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let note = Self::lock(&txn, credit_note_id).await?;
        let invoice = InvoiceRepository::lock(&txn, invoice_id).await?;

        let outstanding = (invoice.total_amount - invoice.amount_paid).max(Decimal::ZERO);
        let plan = plan_credit_application(
            note.status.into(),
            note.remaining_credits,
            amount,
            outstanding,
        )?;

        let application = credit_note_applications::ActiveModel {
            id: Set(Uuid::now_v7()),
            credit_note_id: Set(credit_note_id),
            invoice_id: Set(invoice_id),
            amount: Set(plan.amount),
            applied_on: Set(applied_on),
            created_at: Set(now()),
        }
        .insert(&txn)
        .await
        .map_err(BillingError::store)?;

        let mut active: credit_notes::ActiveModel = note.into();
        active.remaining_credits = Set(plan.remaining_after);
        active.status = Set(plan.status_after.into());
        active.updated_at = Set(now());
        let credit_note = active.update(&txn).await.map_err(BillingError::store)?;

        let invoice = InvoiceRepository::reconcile(&txn, invoice).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(
            credit_note_id = %credit_note_id,
            invoice_id = %invoice_id,
            amount = %plan.amount,
            remaining = %plan.remaining_after,
            "Credit applied"
        );
        Ok(CreditApplication {
            application,
            credit_note,
            invoice,
        })
    }

    async fn lock<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<credit_notes::Model, BillingError> {
        credit_notes::Entity::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("credit note", id))
    }

    async fn applications<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Vec<credit_note_applications::Model>, BillingError> {
        credit_note_applications::Entity::find()
            .filter(credit_note_applications::Column::CreditNoteId.eq(id))
            .order_by_asc(credit_note_applications::Column::CreatedAt)
            .all(conn)
            .await
            .map_err(BillingError::store)
    }
}
