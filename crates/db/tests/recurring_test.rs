//! Recurring expense sweep against a real database.

mod common;

use common::{connect, date};
use crmdesk_core::recurring::{AUTO_RECURRING_MARKER, Frequency};
use crmdesk_db::entities::expenses;
use crmdesk_db::repositories::ExpenseInput;
use crmdesk_db::{ExpenseRepository, RecurringRepository};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

async fn clones_of(db: &sea_orm::DatabaseConnection, root: Uuid) -> Vec<expenses::Model> {
    expenses::Entity::find()
        .filter(expenses::Column::RecurringSourceId.eq(root))
        .all(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_monthly_expense_clones_once_per_period() {
    let Some(db) = connect().await else { return };
    let root = ExpenseRepository::new(db.clone())
        .create(ExpenseInput {
            expense_name: Some(format!("Office rent {}", Uuid::now_v7())),
            category: Some("Rent".to_string()),
            entry_date: date(2031, 1, 15),
            amount: dec!(1200),
            currency: Some("USD".to_string()),
            customer_id: None,
            reference_no: None,
            payment_mode: None,
            billable: false,
            note: Some("January".to_string()),
            frequency: Some(Frequency::Monthly),
        })
        .await
        .unwrap();
    let sweeps = RecurringRepository::new(db.clone());

    sweeps.run_sweep(date(2031, 2, 14)).await.unwrap();
    assert!(clones_of(&db, root.id).await.is_empty());

    sweeps.run_sweep(date(2031, 2, 15)).await.unwrap();
    sweeps.run_sweep(date(2031, 2, 15)).await.unwrap();
    let clones = clones_of(&db, root.id).await;
    assert_eq!(clones.len(), 1);
    assert_eq!(clones[0].entry_date, date(2031, 2, 15));
    assert_eq!(clones[0].amount, dec!(1200));
    assert!(clones[0].is_recurring);
    assert_eq!(
        clones[0].note.as_deref(),
        Some(format!("{AUTO_RECURRING_MARKER} January").as_str())
    );

    sweeps.run_sweep(date(2031, 3, 15)).await.unwrap();
    assert_eq!(clones_of(&db, root.id).await.len(), 2);
}
