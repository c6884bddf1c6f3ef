//! `SeaORM` Entity for credit_notes table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CreditNoteStatus, DiscountCalc};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_notes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub credit_note_number: String,
    pub contact_id: Uuid,
    pub credit_date: Date,
    pub reference: Option<String>,
    pub currency: Option<String>,
    pub status: CreditNoteStatus,
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
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub remaining_credits: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub terms: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub client_note: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_note: Option<String>,
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
    #[sea_orm(has_many = "super::credit_note_applications::Entity")]
    CreditNoteApplications,
}

impl Related<super::contacts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contacts.def()
    }
}

impl Related<super::credit_note_applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreditNoteApplications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
