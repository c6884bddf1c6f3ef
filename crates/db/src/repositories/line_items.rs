//! Line items of every document family.

use crmdesk_core::BillingError;
use crmdesk_core::document::LineItem;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::line_items;

/// Document a set of line items belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOwner {
    /// Items of an estimate.
    Estimate(Uuid),
    /// Items of an invoice.
    Invoice(Uuid),
    /// Items of a credit note.
    CreditNote(Uuid),
    /// Items of a proposal.
    Proposal(Uuid),
}

impl ItemOwner {
    const fn column(self) -> line_items::Column {
        match self {
            Self::Estimate(_) => line_items::Column::EstimateId,
            Self::Invoice(_) => line_items::Column::InvoiceId,
            Self::CreditNote(_) => line_items::Column::CreditNoteId,
            Self::Proposal(_) => line_items::Column::ProposalId,
        }
    }

    const fn id(self) -> Uuid {
        match self {
            Self::Estimate(id) | Self::Invoice(id) | Self::CreditNote(id) | Self::Proposal(id) => {
                id
            }
        }
    }

    fn active_model(self, position: i32, item: &LineItem) -> line_items::ActiveModel {
        let id = self.id();
        line_items::ActiveModel {
            id: Set(Uuid::now_v7()),
            estimate_id: Set(matches!(self, Self::Estimate(_)).then_some(id)),
            invoice_id: Set(matches!(self, Self::Invoice(_)).then_some(id)),
            credit_note_id: Set(matches!(self, Self::CreditNote(_)).then_some(id)),
            proposal_id: Set(matches!(self, Self::Proposal(_)).then_some(id)),
            position: Set(position),
            description: Set(item.description.clone()),
            long_description: Set(item.long_description.clone()),
            qty: Set(item.qty),
            rate: Set(item.rate),
            tax: Set(item.tax),
            amount: Set(item.amount),
        }
    }
}

impl From<line_items::Model> for LineItem {
    fn from(row: line_items::Model) -> Self {
        Self {
            description: row.description,
            long_description: row.long_description,
            qty: row.qty,
            rate: row.rate,
            tax: row.tax,
            amount: row.amount,
        }
    }
}

/// Inserts `items` for `owner`, numbering positions from zero.
pub async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    owner: ItemOwner,
    items: &[LineItem],
) -> Result<(), BillingError> {
    if items.is_empty() {
        return Ok(());
    }

    let rows = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            i32::try_from(idx)
                .map(|position| owner.active_model(position, item))
                .map_err(|_| BillingError::validation("too many line items"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    line_items::Entity::insert_many(rows)
        .exec(conn)
        .await
        .map_err(BillingError::store)?;
    Ok(())
}

/// Replaces every item of `owner` with `items`.
pub async fn replace_items<C: ConnectionTrait>(
    conn: &C,
    owner: ItemOwner,
    items: &[LineItem],
) -> Result<(), BillingError> {
    line_items::Entity::delete_many()
        .filter(owner.column().eq(owner.id()))
        .exec(conn)
        .await
        .map_err(BillingError::store)?;
    insert_items(conn, owner, items).await
}

/// Loads the items of `owner` in position order.
pub async fn load_items<C: ConnectionTrait>(
    conn: &C,
    owner: ItemOwner,
) -> Result<Vec<LineItem>, BillingError> {
    let rows = line_items::Entity::find()
        .filter(owner.column().eq(owner.id()))
        .order_by_asc(line_items::Column::Position)
        .all(conn)
        .await
        .map_err(BillingError::store)?;
    Ok(rows.into_iter().map(LineItem::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::ActiveValue;

    #[test]
    fn test_owner_sets_exactly_one_parent() {
        let id = Uuid::now_v7();
        let item = LineItem::new("Design", dec!(2), dec!(50));
        let row = ItemOwner::CreditNote(id).active_model(3, &item);

        assert_eq!(row.credit_note_id, ActiveValue::Set(Some(id)));
        assert_eq!(row.estimate_id, ActiveValue::Set(None));
        assert_eq!(row.invoice_id, ActiveValue::Set(None));
        assert_eq!(row.proposal_id, ActiveValue::Set(None));
        assert_eq!(row.position, ActiveValue::Set(3));
        assert_eq!(row.amount, ActiveValue::Set(dec!(100.00)));
    }

    #[test]
    fn test_owner_column() {
        let id = Uuid::now_v7();
        assert_eq!(ItemOwner::Invoice(id).id(), id);
        assert!(matches!(
            ItemOwner::Proposal(id).column(),
            line_items::Column::ProposalId
        ));
    }
}
