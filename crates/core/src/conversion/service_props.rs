//! Property-based tests for conversion planning.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::service::ConversionService;
use super::types::EstimateSource;
use crate::document::{DocumentTotals, EstimateStatus, InvoiceStatus, LineItem};

fn item_strategy() -> impl Strategy<Value = LineItem> {
    ("[A-Za-z ]{1,20}", 1i64..100, 0i64..1_000_000, 0i64..=100).prop_map(
        |(description, qty, rate_cents, tax)| {
            LineItem::new(
                format!("x{description}"),
                Decimal::from(qty),
                Decimal::new(rate_cents, 2),
            )
            .with_tax(Decimal::from(tax))
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Conversion copies every line item 1:1 in order and keeps the total.
    #[test]
    fn prop_items_copied_one_to_one(
        items in prop::collection::vec(item_strategy(), 0..12),
        day_offset in 0u64..3650,
    ) {
        let total: Decimal = items.iter().map(|i| i.amount).sum();
        let source = EstimateSource {
            id: Uuid::now_v7(),
            number: "EST-000001".to_string(),
            contact_id: Uuid::now_v7(),
            status: EstimateStatus::Sent,
            totals: DocumentTotals::flat(total),
            currency: None,
            sale_agent: None,
            terms: None,
            client_note: None,
            admin_note: None,
            items: items.clone(),
        };
        let today = NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.checked_add_days(chrono::Days::new(day_offset)))
            .unwrap_or_default();

        let draft = ConversionService::estimate_to_invoice(&source, today);
        prop_assert!(draft.is_ok());
        let draft = draft.unwrap_or_else(|_| unreachable!());
        prop_assert_eq!(draft.items, items);
        prop_assert_eq!(draft.totals.total_amount, total);
        prop_assert_eq!(draft.status, InvoiceStatus::Unpaid);
        prop_assert_eq!((draft.due_date - draft.issue_date).num_days(), 30);
    }
}
