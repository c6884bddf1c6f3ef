//! Document number allocation.
//!
//! Each numbered family keeps its last issued number in
//! `document_sequences`. Allocation locks that row, so two transactions
//! creating documents of the same family serialize on it and never see
//! the same "last" number. The lock is held until the caller's
//! transaction ends, which is also when the new document becomes visible.

use crmdesk_core::BillingError;
use crmdesk_core::document::DocumentFamily;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QuerySelect, Set,
};
use tracing::debug;

use super::support::now;
use crate::entities::document_sequences;

/// Reads and advances document sequences.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    db: DatabaseConnection,
}

impl SequenceRepository {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Number the next document of `family` would receive.
    ///
    /// Nothing is reserved; a concurrent create may take this number first.
    pub async fn preview(&self, family: DocumentFamily) -> Result<String, BillingError> {
        let row = document_sequences::Entity::find_by_id(family.as_str().to_owned())
            .one(&self.db)
            .await
            .map_err(BillingError::store)?;
        Ok(family.next_after(row.and_then(|r| r.last_number).as_deref()))
    }

    /// Allocates the next number of `family` inside the caller's transaction.
    ///
    /// A malformed or missing last number restarts the family at `000001`.
    pub async fn allocate<C: ConnectionTrait>(
        conn: &C,
        family: DocumentFamily,
    ) -> Result<String, BillingError> {
        let row = document_sequences::Entity::find_by_id(family.as_str().to_owned())
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(BillingError::store)?;

        let number = family.next_after(row.as_ref().and_then(|r| r.last_number.as_deref()));

        match row {
            Some(row) => {
                let mut active: document_sequences::ActiveModel = row.into();
                active.last_number = Set(Some(number.clone()));
                active.updated_at = Set(now());
                active.update(conn).await.map_err(BillingError::store)?;
            }
            None => {
                document_sequences::ActiveModel {
                    family: Set(family.as_str().to_owned()),
                    last_number: Set(Some(number.clone())),
                    updated_at: Set(now()),
                }
                .insert(conn)
                .await
                .map_err(BillingError::store)?;
            }
        }

        debug!(family = family.as_str(), number = %number, "Allocated document number");
        Ok(number)
    }
}
