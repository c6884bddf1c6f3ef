//! Helpers shared by the document repositories.

use crmdesk_core::BillingError;
use crmdesk_shared::types::{PageRequest, PageResponse};
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select, prelude::DateTimeWithTimeZone};

use crate::entities::contacts;

/// Current timestamp for audit columns.
pub(crate) fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().into()
}

/// Builds a `DocumentTotals` from any model carrying the totals columns.
macro_rules! totals_of {
    ($model:expr) => {
        ::crmdesk_core::document::DocumentTotals {
            sub_total: $model.sub_total,
            discount_val: $model.discount_val,
            discount_type: $model.discount_type.clone(),
            discount_calc: $model.discount_calc.into(),
            total_tax: $model.total_tax,
            adjustment: $model.adjustment,
            total_amount: $model.total_amount,
        }
    };
}

pub(crate) use totals_of;

/// Fails with `NotFound` unless the contact exists.
pub(crate) async fn ensure_contact<C: ConnectionTrait>(
    conn: &C,
    contact_id: uuid::Uuid,
) -> Result<(), BillingError> {
    contacts::Entity::find_by_id(contact_id)
        .one(conn)
        .await
        .map_err(BillingError::store)?
        .ok_or_else(|| BillingError::not_found("contact", contact_id))?;
    Ok(())
}

/// Runs a select one page at a time.
pub(crate) async fn fetch_page<E>(
    db: &sea_orm::DatabaseConnection,
    select: Select<E>,
    page: &PageRequest,
) -> Result<PageResponse<E::Model>, BillingError>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
{
    let page = page.normalized();
    let paginator = select.paginate(db, page.limit());
    let total = paginator.num_items().await.map_err(BillingError::store)?;
    let data = paginator
        .fetch_page(u64::from(page.page - 1))
        .await
        .map_err(BillingError::store)?;
    Ok(PageResponse::new(data, page.page, page.per_page, total))
}
