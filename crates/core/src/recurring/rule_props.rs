//! Property-based tests for recurrence rules and sweep planning.

use chrono::{Datelike, Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::rule::Frequency;
use super::service::{RecurringExpense, RecurringService};

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0u64..4000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.checked_add_days(Days::new(offset)))
            .unwrap_or_default()
    })
}

fn frequency_strategy() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Weekly),
        Just(Frequency::Monthly),
        Just(Frequency::Yearly),
    ]
}

fn expense(entry_date: NaiveDate, frequency: Frequency) -> RecurringExpense {
    let id = Uuid::now_v7();
    RecurringExpense {
        id,
        root_id: id,
        entry_date,
        frequency,
        expense_name: None,
        category: Some("Software".to_string()),
        amount: Decimal::new(999, 2),
        currency: None,
        customer_id: None,
        payment_mode: None,
        reference_no: None,
        billable: false,
        note: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Nothing recurs on or before its entry date.
    #[test]
    fn prop_never_matches_before_entry(
        entry in date_strategy(),
        back in 0u64..400,
        frequency in frequency_strategy(),
    ) {
        let today = entry.checked_sub_days(Days::new(back)).unwrap_or(entry);
        prop_assert!(!frequency.matches(entry, today));
    }

    /// A monthly expense matches exactly when the day of month agrees.
    #[test]
    fn prop_monthly_matches_day_of_month(entry in date_strategy(), today in date_strategy()) {
        let expected = today > entry && today.day() == entry.day();
        prop_assert_eq!(Frequency::Monthly.matches(entry, today), expected);
    }

    /// A matching day lies in the same period as itself and a chain of
    /// any size yields at most one clone per sweep.
    #[test]
    fn prop_one_clone_per_chain(
        entry in date_strategy(),
        today in date_strategy(),
        frequency in frequency_strategy(),
        members in 1usize..6,
    ) {
        let root = expense(entry, frequency);
        let mut chain = vec![root.clone()];
        for _ in 1..members {
            let mut member = expense(entry, frequency);
            member.root_id = root.id;
            chain.push(member);
        }

        let clones = RecurringService::plan_sweep(&chain, today);
        prop_assert!(clones.len() <= 1);
        prop_assert_eq!(clones.len() == 1, frequency.matches(entry, today));
        for clone in clones {
            prop_assert_eq!(clone.root_id, root.id);
            prop_assert_eq!(clone.period_key, frequency.period_key(today));
        }
    }
}
