//! Estimate repository.

use chrono::NaiveDate;
use crmdesk_core::BillingError;
use crmdesk_core::conversion::{ConversionService, EstimateDraft, EstimateSource};
use crmdesk_core::document::{
    DocumentFamily, DocumentTotals, EstimateStatus, LineItem, StatusCounts, validate_document,
};
use crmdesk_shared::types::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::invoice::{InvoiceDetail, InvoiceRepository};
use super::line_items::{ItemOwner, insert_items, load_items, replace_items};
use super::sequence::SequenceRepository;
use super::support::{ensure_contact, fetch_page, now, totals_of};
use crate::entities::{estimates, sea_orm_active_enums as db_enums};

/// Input for creating or updating an estimate.
#[derive(Debug, Clone)]
pub struct EstimateInput {
    /// Contact the estimate is addressed to.
    pub contact_id: Uuid,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Last day the estimate is valid.
    pub valid_until: Option<NaiveDate>,
    /// Customer reference.
    pub reference: Option<String>,
    /// Currency code.
    pub currency: Option<String>,
    /// Status; defaults to `Draft`.
    pub status: Option<EstimateStatus>,
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

/// An estimate with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateDetail {
    /// Estimate row.
    #[serde(flatten)]
    pub estimate: estimates::Model,
    /// Line items in position order.
    pub items: Vec<LineItem>,
}

/// Estimate repository.
#[derive(Debug, Clone)]
pub struct EstimateRepository {
    db: DatabaseConnection,
}

impl EstimateRepository {
    /// Creates a new estimate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an estimate with a freshly allocated number.
    pub async fn create(&self, input: EstimateInput) -> Result<EstimateDetail, BillingError> {
        validate_document(&input.totals, &input.items)?;
        if input.status == Some(EstimateStatus::Invoiced) {
            return Err(BillingError::validation(
                "an estimate becomes Invoiced only through conversion",
            ));
        }

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        ensure_contact(&txn, input.contact_id).await?;
        let number = SequenceRepository::allocate(&txn, DocumentFamily::Estimate).await?;

        let now = now();
        let totals = input.totals;
        let estimate = estimates::ActiveModel {
            id: Set(Uuid::now_v7()),
            estimate_number: Set(number),
            contact_id: Set(input.contact_id),
            issue_date: Set(input.issue_date),
            valid_until: Set(input.valid_until),
            reference: Set(input.reference),
            currency: Set(input.currency),
            status: Set(input.status.unwrap_or(EstimateStatus::Draft).into()),
            sale_agent: Set(input.sale_agent),
            sub_total: Set(totals.sub_total),
            discount_val: Set(totals.discount_val),
            discount_type: Set(totals.discount_type),
            discount_calc: Set(totals.discount_calc.into()),
            total_tax: Set(totals.total_tax),
            adjustment: Set(totals.adjustment),
            total_amount: Set(totals.total_amount),
            terms: Set(input.terms),
            client_note: Set(input.client_note),
            admin_note: Set(input.admin_note),
            invoice_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(BillingError::store)?;

        insert_items(&txn, ItemOwner::Estimate(estimate.id), &input.items).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(
            estimate_id = %estimate.id,
            number = %estimate.estimate_number,
            "Estimate created"
        );
        Ok(EstimateDetail {
            estimate,
            items: input.items,
        })
    }

    /// Inserts a planned estimate, its number and its items.
    pub(crate) async fn insert_draft<C: ConnectionTrait>(
        conn: &C,
        draft: EstimateDraft,
    ) -> Result<EstimateDetail, BillingError> {
        let number = SequenceRepository::allocate(conn, DocumentFamily::Estimate).await?;

        let now = now();
        let totals = draft.totals;
        let estimate = estimates::ActiveModel {
            id: Set(Uuid::now_v7()),
            estimate_number: Set(number),
            contact_id: Set(draft.contact_id),
            issue_date: Set(draft.issue_date),
            valid_until: Set(Some(draft.valid_until)),
            reference: Set(None),
            currency: Set(draft.currency),
            status: Set(draft.status.into()),
            sale_agent: Set(None),
            sub_total: Set(totals.sub_total),
            discount_val: Set(totals.discount_val),
            discount_type: Set(totals.discount_type),
            discount_calc: Set(totals.discount_calc.into()),
            total_tax: Set(totals.total_tax),
            adjustment: Set(totals.adjustment),
            total_amount: Set(totals.total_amount),
            terms: Set(None),
            client_note: Set(None),
            admin_note: Set(draft.admin_note),
            invoice_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(BillingError::store)?;

        insert_items(conn, ItemOwner::Estimate(estimate.id), &draft.items).await?;
        Ok(EstimateDetail {
            estimate,
            items: draft.items,
        })
    }

    /// Finds an estimate with its items.
    pub async fn find(&self, id: Uuid) -> Result<EstimateDetail, BillingError> {
        let estimate = estimates::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("estimate", id))?;
        let items = load_items(&self.db, ItemOwner::Estimate(id)).await?;
        Ok(EstimateDetail { estimate, items })
    }

    /// Lists estimates, newest first.
    pub async fn list(
        &self,
        status: Option<EstimateStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<estimates::Model>, BillingError> {
        let mut select = estimates::Entity::find();
        if let Some(status) = status {
            select =
                select.filter(estimates::Column::Status.eq(db_enums::EstimateStatus::from(status)));
        }
        let select = select
            .order_by_desc(estimates::Column::IssueDate)
            .order_by_desc(estimates::Column::Id);
        fetch_page(&self.db, select, page).await
    }

    /// Updates an estimate and replaces its items.
    ///
    /// An invoiced estimate keeps its `Invoiced` status.
    pub async fn update(
        &self,
        id: Uuid,
        input: EstimateInput,
    ) -> Result<EstimateDetail, BillingError> {
        validate_document(&input.totals, &input.items)?;

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let existing = Self::lock(&txn, id).await?;
        ensure_contact(&txn, input.contact_id).await?;

        let status = if existing.invoice_id.is_some() {
            EstimateStatus::Invoiced
        } else {
            match input.status {
                Some(EstimateStatus::Invoiced) => {
                    return Err(BillingError::validation(
                        "an estimate becomes Invoiced only through conversion",
                    ));
                }
                Some(status) => status,
                None => existing.status.into(),
            }
        };

        let totals = input.totals;
        let mut active: estimates::ActiveModel = existing.into();
        active.contact_id = Set(input.contact_id);
        active.issue_date = Set(input.issue_date);
        active.valid_until = Set(input.valid_until);
        active.reference = Set(input.reference);
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
        active.terms = Set(input.terms);
        active.client_note = Set(input.client_note);
        active.admin_note = Set(input.admin_note);
        active.updated_at = Set(now());
        let estimate = active.update(&txn).await.map_err(BillingError::store)?;

        replace_items(&txn, ItemOwner::Estimate(id), &input.items).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(estimate_id = %id, "Estimate updated");
        Ok(EstimateDetail {
            estimate,
            items: input.items,
        })
    }

    /// Deletes an estimate and its items.
    pub async fn delete(&self, id: Uuid) -> Result<(), BillingError> {
        let result = estimates::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(BillingError::store)?;
        if result.rows_affected == 0 {
            return Err(BillingError::not_found("estimate", id));
        }
        info!(estimate_id = %id, "Estimate deleted");
        Ok(())
    }

    /// Number the next estimate would receive.
    pub async fn next_number(&self) -> Result<String, BillingError> {
        SequenceRepository::new(self.db.clone())
            .preview(DocumentFamily::Estimate)
            .await
    }

    /// Estimate count per status.
    pub async fn stats(&self) -> Result<StatusCounts, BillingError> {
        let statuses: Vec<db_enums::EstimateStatus> = estimates::Entity::find()
            .select_only()
            .column(estimates::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(BillingError::store)?;
        Ok(StatusCounts::tally(
            EstimateStatus::ALL,
            statuses.into_iter().map(EstimateStatus::from),
        ))
    }

    /// Converts an estimate into a new invoice.
    ///
    /// The invoice number is allocated, the invoice and its copied items are
    /// inserted, and the estimate is marked `Invoiced` in one transaction.
    ///
    /// # Errors
    ///
    /// `Conflict` if the estimate was already invoiced.
    pub async fn convert_to_invoice(
        &self,
        id: Uuid,
        today: NaiveDate,
    ) -> Result<InvoiceDetail, BillingError> {
        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let estimate = Self::lock(&txn, id).await?;
        let items = load_items(&txn, ItemOwner::Estimate(id)).await?;

        let source = EstimateSource {
            id: estimate.id,
            number: estimate.estimate_number.clone(),
            contact_id: estimate.contact_id,
            status: if estimate.invoice_id.is_some() {
                EstimateStatus::Invoiced
            } else {
                estimate.status.into()
            },
            totals: totals_of!(estimate),
            currency: estimate.currency.clone(),
            sale_agent: estimate.sale_agent.clone(),
            terms: estimate.terms.clone(),
            client_note: estimate.client_note.clone(),
            admin_note: estimate.admin_note.clone(),
            items,
        };
        let draft = ConversionService::estimate_to_invoice(&source, today)?;
        let invoice = InvoiceRepository::insert_draft(&txn, draft).await?;

        let mut active: estimates::ActiveModel = estimate.into();
        active.status = Set(db_enums::EstimateStatus::Invoiced);
        active.invoice_id = Set(Some(invoice.invoice.id));
        active.updated_at = Set(now());
        active.update(&txn).await.map_err(BillingError::store)?;

        txn.commit().await.map_err(BillingError::store)?;

        info!(
            estimate_id = %id,
            invoice_id = %invoice.invoice.id,
            number = %invoice.invoice.invoice_number,
            "Estimate converted to invoice"
        );
        Ok(invoice)
    }

    async fn lock<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<estimates::Model, BillingError> {
        estimates::Entity::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("estimate", id))
    }
}
