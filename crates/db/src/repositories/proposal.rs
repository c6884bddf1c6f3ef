//! Proposal repository.

use chrono::NaiveDate;
use crmdesk_core::BillingError;
use crmdesk_core::conversion::{ConversionService, ConversionTarget, ProposalSource};
use crmdesk_core::document::{
    DocumentFamily, DocumentTotals, LineItem, ProposalStatus, StatusCounts, validate_document,
};
use crmdesk_shared::types::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::estimate::{EstimateDetail, EstimateRepository};
use super::invoice::{InvoiceDetail, InvoiceRepository};
use super::line_items::{ItemOwner, insert_items, load_items, replace_items};
use super::sequence::SequenceRepository;
use super::support::{ensure_contact, fetch_page, now, totals_of};
use crate::entities::{proposals, sea_orm_active_enums as db_enums};

/// Input for creating or updating a proposal.
#[derive(Debug, Clone)]
pub struct ProposalInput {
    /// Contact the proposal is addressed to.
    pub contact_id: Uuid,
    /// Subject line.
    pub subject: String,
    /// Proposal date.
    pub proposal_date: NaiveDate,
    /// Last day the proposal is open.
    pub open_till: Option<NaiveDate>,
    /// Currency code.
    pub currency: Option<String>,
    /// Status; defaults to `Draft`.
    pub status: Option<ProposalStatus>,
    /// Monetary totals.
    pub totals: DocumentTotals,
    /// Line items, in display order.
    pub items: Vec<LineItem>,
}

/// A proposal with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalDetail {
    /// Proposal row.
    #[serde(flatten)]
    pub proposal: proposals::Model,
    /// Line items in position order.
    pub items: Vec<LineItem>,
}

/// Document a proposal was converted into.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "document", rename_all = "snake_case")]
pub enum ProposalConversion {
    /// New invoice.
    Invoice(InvoiceDetail),
    /// New estimate.
    Estimate(EstimateDetail),
}

/// Proposal repository.
#[derive(Debug, Clone)]
pub struct ProposalRepository {
    db: DatabaseConnection,
}

impl ProposalRepository {
    /// Creates a new proposal repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a proposal with a freshly allocated number.
    pub async fn create(&self, input: ProposalInput) -> Result<ProposalDetail, BillingError> {
        validate_document(&input.totals, &input.items)?;
        let subject = required_subject(&input.subject)?;

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        ensure_contact(&txn, input.contact_id).await?;
        let number = SequenceRepository::allocate(&txn, DocumentFamily::Proposal).await?;

        let now = now();
        let totals = input.totals;
        let proposal = proposals::ActiveModel {
            id: Set(Uuid::now_v7()),
            proposal_number: Set(number),
            contact_id: Set(input.contact_id),
            subject: Set(subject),
            proposal_date: Set(input.proposal_date),
            open_till: Set(input.open_till),
            currency: Set(input.currency),
            status: Set(input.status.unwrap_or(ProposalStatus::Draft).into()),
            sub_total: Set(totals.sub_total),
            discount_val: Set(totals.discount_val),
            discount_type: Set(totals.discount_type),
            discount_calc: Set(totals.discount_calc.into()),
            total_tax: Set(totals.total_tax),
            adjustment: Set(totals.adjustment),
            total_amount: Set(totals.total_amount),
            converted_invoice_id: Set(None),
            converted_estimate_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(BillingError::store)?;

        insert_items(&txn, ItemOwner::Proposal(proposal.id), &input.items).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(
            proposal_id = %proposal.id,
            number = %proposal.proposal_number,
            "Proposal created"
        );
        Ok(ProposalDetail {
            proposal,
            items: input.items,
        })
    }

    /// Finds a proposal with its items.
    pub async fn find(&self, id: Uuid) -> Result<ProposalDetail, BillingError> {
        let proposal = proposals::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("proposal", id))?;
        let items = load_items(&self.db, ItemOwner::Proposal(id)).await?;
        Ok(ProposalDetail { proposal, items })
    }

    /// Lists proposals, newest first.
    pub async fn list(
        &self,
        status: Option<ProposalStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<proposals::Model>, BillingError> {
        let mut select = proposals::Entity::find();
        if let Some(status) = status {
            select =
                select.filter(proposals::Column::Status.eq(db_enums::ProposalStatus::from(status)));
        }
        let select = select
            .order_by_desc(proposals::Column::ProposalDate)
            .order_by_desc(proposals::Column::Id);
        fetch_page(&self.db, select, page).await
    }

    /// Updates a proposal and replaces its items.
    ///
    /// Conversion links are kept; a converted proposal stays `Accepted`.
    pub async fn update(
        &self,
        id: Uuid,
        input: ProposalInput,
    ) -> Result<ProposalDetail, BillingError> {
        validate_document(&input.totals, &input.items)?;
        let subject = required_subject(&input.subject)?;

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let existing = Self::lock(&txn, id).await?;
        ensure_contact(&txn, input.contact_id).await?;

        let converted =
            existing.converted_invoice_id.is_some() || existing.converted_estimate_id.is_some();
        let status = if converted {
            ProposalStatus::Accepted
        } else {
            input
                .status
                .unwrap_or_else(|| ProposalStatus::from(existing.status))
        };

        let totals = input.totals;
        let mut active: proposals::ActiveModel = existing.into();
        active.contact_id = Set(input.contact_id);
        active.subject = Set(subject);
        active.proposal_date = Set(input.proposal_date);
        active.open_till = Set(input.open_till);
        active.currency = Set(input.currency);
        active.status = Set(status.into());
        active.sub_total = Set(totals.sub_total);
        active.discount_val = Set(totals.discount_val);
        active.discount_type = Set(totals.discount_type);
        active.discount_calc = Set(totals.discount_calc.into());
        active.total_tax = Set(totals.total_tax);
        active.adjustment = Set(totals.adjustment);
        active.total_amount = Set(totals.total_amount);
        active.updated_at = Set(now());
        let proposal = active.update(&txn).await.map_err(BillingError::store)?;

        replace_items(&txn, ItemOwner::Proposal(id), &input.items).await?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(proposal_id = %id, "Proposal updated");
        Ok(ProposalDetail {
            proposal,
            items: input.items,
        })
    }

    /// Deletes a proposal and its items.
    pub async fn delete(&self, id: Uuid) -> Result<(), BillingError> {
        let result = proposals::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(BillingError::store)?;
        if result.rows_affected == 0 {
            return Err(BillingError::not_found("proposal", id));
        }
        info!(proposal_id = %id, "Proposal deleted");
        Ok(())
    }

    /// Number the next proposal would receive.
    pub async fn next_number(&self) -> Result<String, BillingError> {
        SequenceRepository::new(self.db.clone())
            .preview(DocumentFamily::Proposal)
            .await
    }

    /// Proposal count per status.
    pub async fn stats(&self) -> Result<StatusCounts, BillingError> {
        let statuses: Vec<db_enums::ProposalStatus> = proposals::Entity::find()
            .select_only()
            .column(proposals::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(BillingError::store)?;
        Ok(StatusCounts::tally(
            ProposalStatus::ALL,
            statuses.into_iter().map(ProposalStatus::from),
        ))
    }

    /// Converts a proposal into a new invoice or estimate.
    ///
    /// The proposal becomes `Accepted` and records the document it produced.
    ///
    /// # Errors
    ///
    /// `Conflict` if the proposal was already converted into either.
    pub async fn convert(
        &self,
        id: Uuid,
        target: ConversionTarget,
        today: NaiveDate,
    ) -> Result<ProposalConversion, BillingError> {
        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let proposal = Self::lock(&txn, id).await?;
        let items = load_items(&txn, ItemOwner::Proposal(id)).await?;

        let converted_to = match (proposal.converted_invoice_id, proposal.converted_estimate_id) {
            (Some(_), _) => Some(ConversionTarget::Invoice),
            (None, Some(_)) => Some(ConversionTarget::Estimate),
            (None, None) => None,
        };
        let source = ProposalSource {
            id: proposal.id,
            number: proposal.proposal_number.clone(),
            contact_id: proposal.contact_id,
            subject: proposal.subject.clone(),
            status: proposal.status.into(),
            totals: totals_of!(proposal),
            currency: proposal.currency.clone(),
            converted_to,
            items,
        };

        let mut active: proposals::ActiveModel = proposal.into();
        let conversion = match target {
            ConversionTarget::Invoice => {
                let draft = ConversionService::proposal_to_invoice(&source, today)?;
                let invoice = InvoiceRepository::insert_draft(&txn, draft).await?;
                active.converted_invoice_id = Set(Some(invoice.invoice.id));
                ProposalConversion::Invoice(invoice)
            }
            ConversionTarget::Estimate => {
                let draft = ConversionService::proposal_to_estimate(&source, today)?;
                let estimate = EstimateRepository::insert_draft(&txn, draft).await?;
                active.converted_estimate_id = Set(Some(estimate.estimate.id));
                ProposalConversion::Estimate(estimate)
            }
        };
        active.status = Set(db_enums::ProposalStatus::Accepted);
        active.updated_at = Set(now());
        active.update(&txn).await.map_err(BillingError::store)?;

        txn.commit().await.map_err(BillingError::store)?;

        info!(proposal_id = %id, target = ?target, "Proposal converted");
        Ok(conversion)
    }

    async fn lock<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<proposals::Model, BillingError> {
        proposals::Entity::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("proposal", id))
    }
}

fn required_subject(subject: &str) -> Result<String, BillingError> {
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(BillingError::validation("proposal subject is required"));
    }
    Ok(subject.to_owned())
}
