//! Recurrence rules.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How often a recurring expense repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// Same weekday every week.
    Weekly,
    /// Same day of month every month.
    Monthly,
    /// Same day and month every year.
    Yearly,
}

impl Frequency {
    /// Returns the exact string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Yearly => "Yearly",
        }
    }

    /// Parses a frequency, ignoring ASCII case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    /// Whether an expense first entered on `entry_date` recurs on `today`.
    ///
    /// Never true on or before the entry date itself. A monthly expense
    /// entered on the 31st only recurs in months that have a 31st.
    #[must_use]
    pub fn matches(self, entry_date: NaiveDate, today: NaiveDate) -> bool {
        if today <= entry_date {
            return false;
        }
        match self {
            Self::Weekly => today.weekday() == entry_date.weekday(),
            Self::Monthly => today.day() == entry_date.day(),
            Self::Yearly => today.day() == entry_date.day() && today.month() == entry_date.month(),
        }
    }

    /// Key of the period containing `date`, used to deduplicate clones.
    ///
    /// Weekly periods are ISO weeks (`2026-W43`), monthly `2026-10`, yearly `2026`.
    #[must_use]
    pub fn period_key(self, date: NaiveDate) -> String {
        match self {
            Self::Weekly => {
                let week = date.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Self::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
            Self::Yearly => format!("{:04}", date.year()),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(Frequency::Monthly, date(2026, 1, 15), date(2026, 3, 15), true)]
    #[case(Frequency::Monthly, date(2026, 1, 15), date(2026, 3, 16), false)]
    #[case(Frequency::Monthly, date(2026, 1, 15), date(2026, 1, 15), false)]
    #[case(Frequency::Monthly, date(2026, 1, 31), date(2026, 2, 28), false)]
    #[case(Frequency::Weekly, date(2026, 10, 5), date(2026, 10, 19), true)]
    #[case(Frequency::Weekly, date(2026, 10, 5), date(2026, 10, 20), false)]
    #[case(Frequency::Yearly, date(2025, 10, 19), date(2026, 10, 19), true)]
    #[case(Frequency::Yearly, date(2025, 9, 19), date(2026, 10, 19), false)]
    #[case(Frequency::Yearly, date(2027, 10, 19), date(2026, 10, 19), false)]
    fn test_matches(
        #[case] frequency: Frequency,
        #[case] entry: NaiveDate,
        #[case] today: NaiveDate,
        #[case] expected: bool,
    ) {
        assert_eq!(frequency.matches(entry, today), expected);
    }

    #[test]
    fn test_period_keys() {
        let today = date(2026, 10, 19);
        assert_eq!(Frequency::Weekly.period_key(today), "2026-W43");
        assert_eq!(Frequency::Monthly.period_key(today), "2026-10");
        assert_eq!(Frequency::Yearly.period_key(today), "2026");
    }

    #[test]
    fn test_iso_week_crosses_year() {
        // 2026-12-31 is a Thursday in ISO week 53 of 2026
        assert_eq!(Frequency::Weekly.period_key(date(2026, 12, 31)), "2026-W53");
        // 2027-01-01 belongs to the same ISO week
        assert_eq!(Frequency::Weekly.period_key(date(2027, 1, 1)), "2026-W53");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Frequency::parse("monthly"), Some(Frequency::Monthly));
        assert_eq!(Frequency::parse("Yearly"), Some(Frequency::Yearly));
        assert_eq!(Frequency::parse("daily"), None);
    }
}
