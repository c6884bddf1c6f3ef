//! Concurrent payment writes against one invoice.
//!
//! Payments lock the invoice row, so however the writes interleave the
//! stored paid amount must equal the sum of all payments.

use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod common;

use common::{connect, contact, date, invoice_input};
use crmdesk_db::entities::sea_orm_active_enums::InvoiceStatus;
use crmdesk_db::repositories::PaymentInput;
use crmdesk_db::{InvoiceRepository, PaymentRepository};

#[tokio::test]
async fn test_concurrent_payments_sum_exactly() {
    let Some(db) = connect().await else { return };
    let contact_id = contact(&db).await;
    let invoice = InvoiceRepository::new(db.clone())
        .create(invoice_input(contact_id, dec!(100)))
        .await
        .unwrap()
        .invoice;

    let writes = (0..20).map(|i| {
        let repo = PaymentRepository::new(db.clone());
        async move {
            repo.record(PaymentInput {
                invoice_id: invoice.id,
                amount: dec!(5),
                payment_mode: None,
                transaction_id: Some(format!("txn-{i}")),
                payment_date: date(2026, 10, 10),
                note: None,
            })
            .await
        }
    });
    let results = join_all(writes).await;
    assert!(results.iter().all(Result::is_ok));

    let stored = InvoiceRepository::new(db.clone())
        .find(invoice.id)
        .await
        .unwrap()
        .invoice;
    assert_eq!(stored.amount_paid, dec!(100));
    assert_eq!(stored.status, InvoiceStatus::Paid);

    let page = PaymentRepository::new(db)
        .list(Some(invoice.id), &Default::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total, 20);
    let sum: Decimal = page.data.iter().map(|p| p.payment.amount).sum();
    assert_eq!(sum, dec!(100));
}
