//! `SeaORM` Entity for recurring_expense_runs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "recurring_expense_runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub root_expense_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub period_key: String,
    pub expense_id: Option<Uuid>,
    pub run_date: Date,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
