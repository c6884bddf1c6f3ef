//! Database seeder for Crmdesk development and testing.
//!
//! Seeds a demo contact with an estimate, an unpaid invoice, a credit note,
//! and a monthly recurring expense, so every screen has something to show.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Days, Utc};
use crmdesk_core::document::{DocumentTotals, EstimateStatus, LineItem};
use crmdesk_core::recurring::Frequency;
use crmdesk_db::entities::contacts;
use crmdesk_db::repositories::{
    ContactInput, CreditNoteInput, EstimateInput, ExpenseInput, InvoiceInput,
};
use crmdesk_db::{
    ContactRepository, CreditNoteRepository, EstimateRepository, ExpenseRepository,
    InvoiceRepository,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

/// Email of the demo contact; its presence marks the database as seeded.
const DEMO_EMAIL: &str = "billing@acme.test";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("CRMDESK__DATABASE__URL"))
        .context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = crmdesk_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    if contacts::Entity::find()
        .filter(contacts::Column::Email.eq(DEMO_EMAIL))
        .one(&db)
        .await?
        .is_some()
    {
        println!("Demo data already present, skipping.");
        return Ok(());
    }

    println!("Seeding demo contact...");
    let contact_id = seed_contact(&db).await?;

    println!("Seeding estimate...");
    seed_estimate(&db, contact_id).await?;

    println!("Seeding invoice...");
    seed_invoice(&db, contact_id).await?;

    println!("Seeding credit note...");
    seed_credit_note(&db, contact_id).await?;

    println!("Seeding recurring expense...");
    seed_recurring_expense(&db, contact_id).await?;

    println!("Seeding complete!");
    Ok(())
}

fn money(units: i64) -> Decimal {
    Decimal::new(units * 100, 2)
}

fn totals_of(items: &[LineItem]) -> DocumentTotals {
    DocumentTotals::flat(items.iter().map(|item| item.amount).sum())
}

async fn seed_contact(db: &DatabaseConnection) -> anyhow::Result<Uuid> {
    let contact = ContactRepository::new(db.clone())
        .create(ContactInput {
            name: "Acme Corporation".to_string(),
            email: Some(DEMO_EMAIL.to_string()),
            phone: Some("+1 555 0100".to_string()),
            company: Some("Acme Corporation".to_string()),
            address: Some("1 Market Street".to_string()),
            city: Some("Springfield".to_string()),
            country: Some("US".to_string()),
            currency: Some("USD".to_string()),
        })
        .await?;

    println!("  Created contact: {}", contact.name);
    Ok(contact.id)
}

async fn seed_estimate(db: &DatabaseConnection, contact_id: Uuid) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let items = vec![
        LineItem::new("Discovery workshop", Decimal::ONE, money(1_200)),
        LineItem::new("Website redesign", Decimal::ONE, money(4_800))
            .with_long_description("Five templates, responsive, two revision rounds"),
        LineItem::new("Hosting (months)", Decimal::new(12, 0), money(25)),
    ];

    let estimate = EstimateRepository::new(db.clone())
        .create(EstimateInput {
            contact_id,
            issue_date: today,
            valid_until: today.checked_add_days(Days::new(30)),
            reference: Some("Q4 website".to_string()),
            currency: Some("USD".to_string()),
            status: Some(EstimateStatus::Sent),
            sale_agent: None,
            totals: totals_of(&items),
            terms: Some("50% upfront".to_string()),
            client_note: None,
            admin_note: None,
            items,
        })
        .await?;

    println!("  Created estimate {}", estimate.estimate.estimate_number);
    Ok(())
}

async fn seed_invoice(db: &DatabaseConnection, contact_id: Uuid) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let items = vec![LineItem::new("Support retainer", Decimal::ONE, money(600))];

    let invoice = InvoiceRepository::new(db.clone())
        .create(InvoiceInput {
            contact_id,
            issue_date: today,
            due_date: None,
            currency: Some("USD".to_string()),
            status: None,
            sale_agent: None,
            totals: totals_of(&items),
            terms: None,
            client_note: Some("Thank you for your business".to_string()),
            admin_note: None,
            items,
        })
        .await?;

    println!("  Created invoice {}", invoice.invoice.invoice_number);
    Ok(())
}

async fn seed_credit_note(db: &DatabaseConnection, contact_id: Uuid) -> anyhow::Result<()> {
    let items = vec![LineItem::new("Service credit", Decimal::ONE, money(150))];

    let note = CreditNoteRepository::new(db.clone())
        .create(CreditNoteInput {
            contact_id,
            credit_date: Utc::now().date_naive(),
            reference: Some("Outage October".to_string()),
            currency: Some("USD".to_string()),
            status: None,
            totals: totals_of(&items),
            terms: None,
            client_note: None,
            admin_note: None,
            items,
        })
        .await?;

    println!("  Created credit note {}", note.credit_note.credit_note_number);
    Ok(())
}

async fn seed_recurring_expense(db: &DatabaseConnection, contact_id: Uuid) -> anyhow::Result<()> {
    let expense = ExpenseRepository::new(db.clone())
        .create(ExpenseInput {
            expense_name: Some("Office rent".to_string()),
            category: Some("Rent".to_string()),
            entry_date: Utc::now().date_naive(),
            amount: money(2_000),
            currency: Some("USD".to_string()),
            customer_id: Some(contact_id),
            reference_no: None,
            payment_mode: Some("bank".to_string()),
            billable: false,
            note: Some("Monthly lease".to_string()),
            frequency: Some(Frequency::Monthly),
        })
        .await?;

    println!("  Created recurring expense {}", expense.id);
    Ok(())
}
