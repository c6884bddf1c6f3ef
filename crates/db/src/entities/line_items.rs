//! `SeaORM` Entity for line_items table.
//!
//! One table holds the items of every document family; exactly one of the
//! four parent columns is set on each row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "line_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub estimate_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub credit_note_id: Option<Uuid>,
    pub proposal_id: Option<Uuid>,
    pub position: i32,
    pub description: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub long_description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((15, 4)))")]
    pub qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
