//! `SeaORM` Entity for proposals table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DiscountCalc, ProposalStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "proposals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub proposal_number: String,
    pub contact_id: Uuid,
    pub subject: String,
    pub proposal_date: Date,
    pub open_till: Option<Date>,
    pub currency: Option<String>,
    pub status: ProposalStatus,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub sub_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub discount_val: Decimal,
    pub discount_type: Option<String>,
    pub discount_calc: DiscountCalc,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_tax: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub adjustment: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_amount: Decimal,
    pub converted_invoice_id: Option<Uuid>,
    pub converted_estimate_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contacts::Entity",
        from = "Column::ContactId",
        to = "super::contacts::Column::Id"
    )]
    Contacts,
}

impl Related<super::contacts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contacts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
