//! `SeaORM` Entity for expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ExpenseFrequency;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_name: Option<String>,
    pub category: Option<String>,
    pub entry_date: Date,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub currency: Option<String>,
    pub customer_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub reference_no: Option<String>,
    pub payment_mode: Option<String>,
    pub billable: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub receipt_path: Option<String>,
    pub is_recurring: bool,
    pub frequency: Option<ExpenseFrequency>,
    pub recurring_source_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Root of the recurrence chain this expense belongs to.
    #[must_use]
    pub fn recurrence_root(&self) -> Uuid {
        self.recurring_source_id.unwrap_or(self.id)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
