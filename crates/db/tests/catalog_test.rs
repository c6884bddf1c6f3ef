//! Contact maintenance and the item catalog against a real database.

mod common;

use common::{connect, contact, invoice_input};
use crmdesk_core::BillingError;
use crmdesk_core::catalog::CatalogItem;
use crmdesk_db::repositories::ContactInput;
use crmdesk_db::{ContactRepository, InvoiceRepository, ItemRepository};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn item(name: &str, group: &str) -> CatalogItem {
    CatalogItem::new(
        name,
        None,
        dec!(40),
        Some("hour".to_string()),
        dec!(10),
        Some(group.to_string()),
    )
}

#[tokio::test]
async fn test_contact_update_and_status() {
    let Some(db) = connect().await else { return };
    let id = contact(&db).await;
    let repo = ContactRepository::new(db.clone());

    let updated = repo
        .update(
            id,
            ContactInput {
                name: "Renamed Ltd".to_string(),
                city: Some("Leeds".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Renamed Ltd");
    assert_eq!(updated.city.as_deref(), Some("Leeds"));
    assert_eq!(updated.email, None);
    assert!(updated.is_active);

    let inactive = repo.set_active(id, false).await.unwrap();
    assert!(!inactive.is_active);
    assert!(!repo.find(id).await.unwrap().is_active);

    let blank = repo
        .update(id, ContactInput { name: "  ".to_string(), ..Default::default() })
        .await;
    assert!(matches!(blank, Err(BillingError::Validation(_))));
}

#[tokio::test]
async fn test_contact_with_invoice_cannot_be_deleted() {
    let Some(db) = connect().await else { return };
    let billed = contact(&db).await;
    let idle = contact(&db).await;
    InvoiceRepository::new(db.clone())
        .create(invoice_input(billed, dec!(75)))
        .await
        .unwrap();
    let repo = ContactRepository::new(db.clone());

    let refused = repo.delete(billed).await;
    assert!(matches!(refused, Err(BillingError::Conflict(_))));
    assert!(repo.find(billed).await.is_ok());

    repo.delete(idle).await.unwrap();
    assert!(matches!(
        repo.find(idle).await,
        Err(BillingError::NotFound { .. })
    ));
    assert!(matches!(
        repo.delete(Uuid::now_v7()).await,
        Err(BillingError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_item_crud() {
    let Some(db) = connect().await else { return };
    let repo = ItemRepository::new(db.clone());
    let group = format!("Group {}", Uuid::now_v7());

    let created = repo.create(item("Consulting", &group)).await.unwrap();
    assert_eq!(created.unit, "hour");
    assert_eq!(created.rate, dec!(40));

    let mut edit = item("Senior consulting", &group);
    edit.rate = dec!(90);
    let updated = repo.update(created.id, edit).await.unwrap();
    assert_eq!(updated.name, "Senior consulting");
    assert_eq!(updated.rate, dec!(90));

    let listed = repo.list(Some(&group), &Default::default()).await.unwrap();
    assert_eq!(listed.meta.total, 1);

    repo.delete(created.id).await.unwrap();
    assert!(matches!(
        repo.delete(created.id).await,
        Err(BillingError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_item_import_is_all_or_nothing() {
    let Some(db) = connect().await else { return };
    let repo = ItemRepository::new(db.clone());
    let group = format!("Group {}", Uuid::now_v7());

    let bad = vec![
        item("Widget", &group),
        CatalogItem::new("Gadget", None, dec!(1.005), None, dec!(0), Some(group.clone())),
    ];
    let err = repo.import(bad).await.unwrap_err();
    assert_eq!(
        err,
        BillingError::validation("row 2: item rate must have at most 2 decimal places")
    );
    let listed = repo.list(Some(&group), &Default::default()).await.unwrap();
    assert_eq!(listed.meta.total, 0);

    let imported = repo
        .import(vec![item("Widget", &group), item("Gadget", &group)])
        .await
        .unwrap();
    assert_eq!(imported.len(), 2);
    let listed = repo.list(Some(&group), &Default::default()).await.unwrap();
    assert_eq!(listed.meta.total, 2);
}
