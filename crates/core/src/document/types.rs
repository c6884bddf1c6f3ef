//! Line items and monetary totals shared by every document family.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a document discount is taken before or after tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountCalc {
    /// Discount reduces the taxable base.
    BeforeTax,
    /// Discount is taken from the taxed total.
    #[default]
    AfterTax,
}

impl DiscountCalc {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeTax => "before_tax",
            Self::AfterTax => "after_tax",
        }
    }

    /// Parses a discount mode. Unknown values are `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "before_tax" => Some(Self::BeforeTax),
            "after_tax" => Some(Self::AfterTax),
            _ => None,
        }
    }
}

impl fmt::Display for DiscountCalc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of a document.
///
/// Items have no identity outside their parent: they are created, replaced,
/// and deleted together with it, and keep the order they were given in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Short description.
    pub description: String,
    /// Optional long description.
    pub long_description: Option<String>,
    /// Quantity.
    pub qty: Decimal,
    /// Unit rate.
    pub rate: Decimal,
    /// Tax rate in percent.
    pub tax: Decimal,
    /// Line amount as entered.
    pub amount: Decimal,
}

impl LineItem {
    /// Creates an untaxed item whose amount is `qty * rate`.
    ///
    /// A product too large for `Decimal` yields `Decimal::MAX`, which line
    /// validation rejects.
    #[must_use]
    pub fn new(description: impl Into<String>, qty: Decimal, rate: Decimal) -> Self {
        Self {
            description: description.into(),
            long_description: None,
            qty,
            rate,
            tax: Decimal::ZERO,
            amount: qty
                .checked_mul(rate)
                .map_or(Decimal::MAX, |amount| amount.round_dp(2)),
        }
    }

    /// Sets the tax rate.
    #[must_use]
    pub fn with_tax(mut self, tax: Decimal) -> Self {
        self.tax = tax;
        self
    }

    /// Sets the long description.
    #[must_use]
    pub fn with_long_description(mut self, text: impl Into<String>) -> Self {
        self.long_description = Some(text.into());
        self
    }
}

/// Monetary totals of a document, copied verbatim on conversion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Sum of line amounts.
    pub sub_total: Decimal,
    /// Discount value.
    pub discount_val: Decimal,
    /// Discount kind as entered (percentage or fixed).
    pub discount_type: Option<String>,
    /// Whether the discount applies before or after tax.
    #[serde(default)]
    pub discount_calc: DiscountCalc,
    /// Total tax.
    pub total_tax: Decimal,
    /// Manual adjustment, may be negative.
    pub adjustment: Decimal,
    /// Grand total.
    pub total_amount: Decimal,
}

impl DocumentTotals {
    /// Totals for a single untaxed amount.
    #[must_use]
    pub fn flat(amount: Decimal) -> Self {
        Self {
            sub_total: amount,
            total_amount: amount,
            ..Self::default()
        }
    }
}
