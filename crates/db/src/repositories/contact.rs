//! Contact repository.

use crmdesk_core::BillingError;
use crmdesk_shared::types::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::support::{fetch_page, now};
use crate::entities::{contacts, credit_notes, estimates, invoices, payments, proposals};

/// Input for creating or updating a contact.
#[derive(Debug, Clone, Default)]
pub struct ContactInput {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Company name.
    pub company: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Default currency code.
    pub currency: Option<String>,
}

impl ContactInput {
    fn validated_name(&self) -> Result<String, BillingError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BillingError::validation("contact name is required"));
        }
        Ok(name.to_owned())
    }
}

/// Contact repository.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    db: DatabaseConnection,
}

impl ContactRepository {
    /// Creates a new contact repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an active contact.
    pub async fn create(&self, input: ContactInput) -> Result<contacts::Model, BillingError> {
        let name = input.validated_name()?;

        let now = now();
        let contact = contacts::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name),
            email: Set(input.email),
            phone: Set(input.phone),
            company: Set(input.company),
            address: Set(input.address),
            city: Set(input.city),
            country: Set(input.country),
            currency: Set(input.currency),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(BillingError::store)?;

        info!(contact_id = %contact.id, "Contact created");
        Ok(contact)
    }

    /// Finds a contact by ID.
    pub async fn find(&self, id: Uuid) -> Result<contacts::Model, BillingError> {
        contacts::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("contact", id))
    }

    /// Lists contacts by name.
    pub async fn list(
        &self,
        page: &PageRequest,
    ) -> Result<PageResponse<contacts::Model>, BillingError> {
        let select = contacts::Entity::find()
            .order_by_asc(contacts::Column::Name)
            .order_by_asc(contacts::Column::Id);
        fetch_page(&self.db, select, page).await
    }

    /// Replaces a contact's details; the active flag is left alone.
    pub async fn update(
        &self,
        id: Uuid,
        input: ContactInput,
    ) -> Result<contacts::Model, BillingError> {
        let name = input.validated_name()?;
        let existing = self.find(id).await?;

        let mut active: contacts::ActiveModel = existing.into();
        active.name = Set(name);
        active.email = Set(input.email);
        active.phone = Set(input.phone);
        active.company = Set(input.company);
        active.address = Set(input.address);
        active.city = Set(input.city);
        active.country = Set(input.country);
        active.currency = Set(input.currency);
        active.updated_at = Set(now());
        let contact = active.update(&self.db).await.map_err(BillingError::store)?;

        info!(contact_id = %id, "Contact updated");
        Ok(contact)
    }

    /// Marks a contact active or inactive.
    pub async fn set_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> Result<contacts::Model, BillingError> {
        let existing = self.find(id).await?;
        if existing.is_active == is_active {
            return Ok(existing);
        }

        let mut active: contacts::ActiveModel = existing.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(now());
        let contact = active.update(&self.db).await.map_err(BillingError::store)?;

        info!(contact_id = %id, is_active, "Contact status changed");
        Ok(contact)
    }

    /// Deletes a contact.
    ///
    /// Contacts that documents or payments still refer to cannot be deleted;
    /// expenses billed to them lose their customer.
    pub async fn delete(&self, id: Uuid) -> Result<(), BillingError> {
        let txn = self.db.begin().await.map_err(BillingError::store)?;
        contacts::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("contact", id))?;

        if let Some(kind) = Self::referenced_by(&txn, id).await? {
            return Err(BillingError::conflict(format!(
                "contact {id} has {kind} and cannot be deleted"
            )));
        }

        contacts::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(BillingError::store)?;
        txn.commit().await.map_err(BillingError::store)?;

        info!(contact_id = %id, "Contact deleted");
        Ok(())
    }

    /// First kind of record that still points at the contact.
    async fn referenced_by<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<&'static str>, BillingError> {
        let counts = [
            (
                "invoices",
                invoices::Entity::find()
                    .filter(invoices::Column::ContactId.eq(id))
                    .count(conn)
                    .await,
            ),
            (
                "estimates",
                estimates::Entity::find()
                    .filter(estimates::Column::ContactId.eq(id))
                    .count(conn)
                    .await,
            ),
            (
                "proposals",
                proposals::Entity::find()
                    .filter(proposals::Column::ContactId.eq(id))
                    .count(conn)
                    .await,
            ),
            (
                "credit notes",
                credit_notes::Entity::find()
                    .filter(credit_notes::Column::ContactId.eq(id))
                    .count(conn)
                    .await,
            ),
            (
                "payments",
                payments::Entity::find()
                    .filter(payments::Column::ContactId.eq(id))
                    .count(conn)
                    .await,
            ),
        ];

        for (kind, count) in counts {
            if count.map_err(BillingError::store)? > 0 {
                return Ok(Some(kind));
            }
        }
        Ok(None)
    }
}
