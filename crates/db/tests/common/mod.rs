//! Shared setup for database integration tests.
//!
//! Tests run against `DATABASE_URL` (or `CRMDESK__DATABASE__URL`) and skip
//! themselves when neither is set.

#![allow(dead_code)]

use std::env;

use chrono::NaiveDate;
use crmdesk_core::document::{DocumentTotals, LineItem};
use crmdesk_db::ContactRepository;
use crmdesk_db::migration::Migrator;
use crmdesk_db::repositories::{ContactInput, InvoiceInput};
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

fn database_url() -> Option<String> {
    env::var("DATABASE_URL")
        .or_else(|_| env::var("CRMDESK__DATABASE__URL"))
        .ok()
}

/// Connects and migrates, or returns `None` when no database is configured.
pub async fn connect() -> Option<DatabaseConnection> {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    MIGRATED
        .get_or_init(|| async {
            let db = Database::connect(&url).await.expect("connect for migrations");
            Migrator::up(&db, None).await.expect("apply migrations");
        })
        .await;

    Some(Database::connect(&url).await.expect("connect to test database"))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Creates a throwaway contact.
pub async fn contact(db: &DatabaseConnection) -> Uuid {
    ContactRepository::new(db.clone())
        .create(ContactInput {
            name: format!("Test Contact {}", Uuid::now_v7()),
            email: Some("billing@example.com".to_string()),
            ..Default::default()
        })
        .await
        .expect("create contact")
        .id
}

/// Totals whose grand total is `amount`.
pub fn totals(amount: Decimal) -> DocumentTotals {
    DocumentTotals::flat(amount)
}

/// Invoice input with a single line for `amount`.
pub fn invoice_input(contact_id: Uuid, amount: Decimal) -> InvoiceInput {
    InvoiceInput {
        contact_id,
        issue_date: date(2026, 10, 1),
        due_date: None,
        currency: Some("USD".to_string()),
        status: None,
        sale_agent: None,
        totals: totals(amount),
        terms: None,
        client_note: None,
        admin_note: None,
        items: vec![LineItem::new("Consulting", Decimal::ONE, amount)],
    }
}
