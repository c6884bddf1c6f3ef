//! `SeaORM` active enums mirroring the Postgres enum types.
//!
//! Conversions to and from the `crmdesk-core` enums live here so repositories
//! never compare status strings by hand.

use crmdesk_core::document as core;
use crmdesk_core::recurring::Frequency;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "estimate_status")]
pub enum EstimateStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Sent")]
    Sent,
    #[sea_orm(string_value = "Expired")]
    Expired,
    #[sea_orm(string_value = "Declined")]
    Declined,
    #[sea_orm(string_value = "Accepted")]
    Accepted,
    #[sea_orm(string_value = "Invoiced")]
    Invoiced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_status")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Unpaid")]
    Unpaid,
    #[sea_orm(string_value = "Partially Paid")]
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    #[sea_orm(string_value = "Paid")]
    Paid,
    #[sea_orm(string_value = "Overdue")]
    Overdue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "credit_note_status")]
pub enum CreditNoteStatus {
    #[sea_orm(string_value = "Open")]
    Open,
    #[sea_orm(string_value = "Closed")]
    Closed,
    #[sea_orm(string_value = "Void")]
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "proposal_status")]
pub enum ProposalStatus {
    #[sea_orm(string_value = "Draft")]
    Draft,
    #[sea_orm(string_value = "Sent")]
    Sent,
    #[sea_orm(string_value = "Open")]
    Open,
    #[sea_orm(string_value = "Revised")]
    Revised,
    #[sea_orm(string_value = "Declined")]
    Declined,
    #[sea_orm(string_value = "Accepted")]
    Accepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "discount_calc")]
#[serde(rename_all = "snake_case")]
pub enum DiscountCalc {
    #[sea_orm(string_value = "before_tax")]
    BeforeTax,
    #[sea_orm(string_value = "after_tax")]
    AfterTax,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_frequency")]
pub enum ExpenseFrequency {
    #[sea_orm(string_value = "Weekly")]
    Weekly,
    #[sea_orm(string_value = "Monthly")]
    Monthly,
    #[sea_orm(string_value = "Yearly")]
    Yearly,
}

/// Maps variants one-to-one in both directions.
macro_rules! mirror_enum {
    ($db:ident, $core:ty, [$($variant:ident),+ $(,)?]) => {
        impl From<$core> for $db {
            fn from(value: $core) -> Self {
                match value {
                    $(<$core>::$variant => Self::$variant),+
                }
            }
        }

        impl From<$db> for $core {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant),+
                }
            }
        }
    };
}

mirror_enum!(EstimateStatus, core::EstimateStatus, [Draft, Sent, Expired, Declined, Accepted, Invoiced]);
mirror_enum!(InvoiceStatus, core::InvoiceStatus, [Draft, Unpaid, PartiallyPaid, Paid, Overdue]);
mirror_enum!(CreditNoteStatus, core::CreditNoteStatus, [Open, Closed, Void]);
mirror_enum!(ProposalStatus, core::ProposalStatus, [Draft, Sent, Open, Revised, Declined, Accepted]);
mirror_enum!(DiscountCalc, core::DiscountCalc, [BeforeTax, AfterTax]);
mirror_enum!(ExpenseFrequency, Frequency, [Weekly, Monthly, Yearly]);

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveEnum;

    #[test]
    fn test_db_values_match_core_strings() {
        for status in core::InvoiceStatus::ALL {
            let db: InvoiceStatus = (*status).into();
            assert_eq!(db.to_value(), status.as_str());
            assert_eq!(core::InvoiceStatus::from(db), *status);
        }
        for status in core::EstimateStatus::ALL {
            let db: EstimateStatus = (*status).into();
            assert_eq!(db.to_value(), status.as_str());
        }
        for status in core::CreditNoteStatus::ALL {
            let db: CreditNoteStatus = (*status).into();
            assert_eq!(db.to_value(), status.as_str());
        }
    }

    #[test]
    fn test_frequency_values() {
        let db: ExpenseFrequency = Frequency::Monthly.into();
        assert_eq!(db.to_value(), "Monthly");
        assert_eq!(Frequency::from(ExpenseFrequency::Yearly), Frequency::Yearly);
    }
}
