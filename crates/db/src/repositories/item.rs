//! Item catalog repository.

use crmdesk_core::BillingError;
use crmdesk_core::catalog::CatalogItem;
use crmdesk_shared::types::{PageRequest, PageResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::support::{fetch_page, now};
use crate::entities::items;

/// Item catalog repository.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    db: DatabaseConnection,
}

impl ItemRepository {
    /// Creates a new item repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds an item to the catalog.
    pub async fn create(&self, item: CatalogItem) -> Result<items::Model, BillingError> {
        item.validate()?;
        let created = Self::insert(&self.db, item).await?;
        info!(item_id = %created.id, "Item created");
        Ok(created)
    }

    /// Imports a batch of items; either all are stored or none.
    pub async fn import(&self, batch: Vec<CatalogItem>) -> Result<Vec<items::Model>, BillingError> {
        if batch.is_empty() {
            return Err(BillingError::validation("import needs at least one item"));
        }
        for (idx, item) in batch.iter().enumerate() {
            item.validate()
                .map_err(|e| BillingError::validation(format!("row {}: {e}", idx + 1)))?;
        }

        let txn = self.db.begin().await.map_err(BillingError::store)?;
        let mut imported = Vec::with_capacity(batch.len());
        for item in batch {
            imported.push(Self::insert(&txn, item).await?);
        }
        txn.commit().await.map_err(BillingError::store)?;

        info!(count = imported.len(), "Items imported");
        Ok(imported)
    }

    async fn insert<C: ConnectionTrait>(
        conn: &C,
        item: CatalogItem,
    ) -> Result<items::Model, BillingError> {
        let now = now();
        items::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(item.name),
            description: Set(item.description),
            rate: Set(item.rate),
            unit: Set(item.unit),
            tax_rate: Set(item.tax_rate),
            group_name: Set(item.group_name),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
        .map_err(BillingError::store)
    }

    /// Finds an item by ID.
    pub async fn find(&self, id: Uuid) -> Result<items::Model, BillingError> {
        items::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(BillingError::store)?
            .ok_or_else(|| BillingError::not_found("item", id))
    }

    /// Lists items newest first, optionally within one group.
    pub async fn list(
        &self,
        group: Option<&str>,
        page: &PageRequest,
    ) -> Result<PageResponse<items::Model>, BillingError> {
        let mut select = items::Entity::find();
        if let Some(group) = group {
            select = select.filter(items::Column::GroupName.eq(group));
        }
        let select = select.order_by_desc(items::Column::Id);
        fetch_page(&self.db, select, page).await
    }

    /// Replaces an item's fields.
    pub async fn update(&self, id: Uuid, item: CatalogItem) -> Result<items::Model, BillingError> {
        item.validate()?;
        let existing = self.find(id).await?;

        let mut active: items::ActiveModel = existing.into();
        active.name = Set(item.name);
        active.description = Set(item.description);
        active.rate = Set(item.rate);
        active.unit = Set(item.unit);
        active.tax_rate = Set(item.tax_rate);
        active.group_name = Set(item.group_name);
        active.updated_at = Set(now());
        let updated = active.update(&self.db).await.map_err(BillingError::store)?;

        info!(item_id = %id, "Item updated");
        Ok(updated)
    }

    /// Removes an item. Documents keep the lines it prefilled.
    pub async fn delete(&self, id: Uuid) -> Result<(), BillingError> {
        let result = items::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(BillingError::store)?;
        if result.rows_affected == 0 {
            return Err(BillingError::not_found("item", id));
        }
        info!(item_id = %id, "Item deleted");
        Ok(())
    }
}
