//! `SeaORM` Entity for estimates table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DiscountCalc, EstimateStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "estimates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub estimate_number: String,
    pub contact_id: Uuid,
    pub issue_date: Date,
    pub valid_until: Option<Date>,
    pub reference: Option<String>,
    pub currency: Option<String>,
    pub status: EstimateStatus,
    pub sale_agent: Option<String>,
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
    #[sea_orm(column_type = "Text", nullable)]
    pub terms: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub client_note: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_note: Option<String>,
    pub invoice_id: Option<Uuid>,
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
