//! Catalog item rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::document::{validate_amount, validate_tax_rate};
use crate::error::BillingError;

/// Unit used when an item does not name one.
pub const DEFAULT_UNIT: &str = "qty";

/// Group used when an item does not name one.
pub const DEFAULT_GROUP: &str = "General";

/// A catalog entry as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Item name, copied into a line's description.
    pub name: String,
    /// Longer description.
    pub description: Option<String>,
    /// Unit rate.
    pub rate: Decimal,
    /// Unit label, e.g. `hour`.
    pub unit: String,
    /// Tax rate in percent.
    pub tax_rate: Decimal,
    /// Group the item is listed under.
    pub group_name: String,
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

impl CatalogItem {
    /// Builds an item, filling a blank unit or group with the defaults.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        rate: Decimal,
        unit: Option<String>,
        tax_rate: Decimal,
        group_name: Option<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_owned(),
            description: description.filter(|d| !d.trim().is_empty()),
            rate,
            unit: or_default(unit, DEFAULT_UNIT),
            tax_rate,
            group_name: or_default(group_name, DEFAULT_GROUP),
        }
    }

    /// Checks the name, rate, and tax rate.
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.name.is_empty() {
            return Err(BillingError::validation("item name is required"));
        }
        validate_amount("item rate", self.rate)?;
        validate_tax_rate("item tax rate", self.tax_rate)
    }
}
