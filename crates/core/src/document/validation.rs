//! Monetary input checks applied before any write.
//!
//! Bounds follow the storage columns: money is `NUMERIC(15,2)`, quantities
//! are `NUMERIC(15,4)` and tax rates `NUMERIC(5,2)`. A value that passes here
//! is stored exactly as given.

use rust_decimal::Decimal;

use super::types::{DocumentTotals, LineItem};
use crate::error::BillingError;

/// Largest storable monetary amount, 9,999,999,999,999.99.
pub const MAX_MONEY: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

/// Largest storable quantity, 99,999,999,999.9999.
pub const MAX_QTY: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 4);

/// Decimal places kept for money.
pub const MONEY_SCALE: u32 = 2;

/// Decimal places kept for quantities.
pub const QTY_SCALE: u32 = 4;

/// Maximum tax rate in percent.
const MAX_TAX_RATE: Decimal = Decimal::ONE_HUNDRED;

fn has_scale_at_most(value: Decimal, scale: u32) -> bool {
    value.round_dp(scale) == value
}

fn check_money(field: &str, value: Decimal, allow_negative: bool) -> Result<(), BillingError> {
    if !has_scale_at_most(value, MONEY_SCALE) {
        return Err(BillingError::validation(format!(
            "{field} must have at most 2 decimal places"
        )));
    }
    if !allow_negative && value.is_sign_negative() && !value.is_zero() {
        return Err(BillingError::validation(format!(
            "{field} cannot be negative"
        )));
    }
    if value.abs() > MAX_MONEY {
        return Err(BillingError::validation(format!(
            "{field} exceeds the maximum of {MAX_MONEY}"
        )));
    }
    Ok(())
}

/// Validates a non-negative monetary amount: at most two decimals and within
/// the storable range.
pub fn validate_amount(field: &str, value: Decimal) -> Result<(), BillingError> {
    check_money(field, value, false)
}

/// Validates a quantity: non-negative, at most four decimals, within range.
pub fn validate_qty(field: &str, value: Decimal) -> Result<(), BillingError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(BillingError::validation(format!(
            "{field} cannot be negative"
        )));
    }
    if !has_scale_at_most(value, QTY_SCALE) {
        return Err(BillingError::validation(format!(
            "{field} must have at most 4 decimal places"
        )));
    }
    if value > MAX_QTY {
        return Err(BillingError::validation(format!(
            "{field} exceeds the maximum of {MAX_QTY}"
        )));
    }
    Ok(())
}

/// Validates a tax rate: between 0 and 100 with at most two decimals.
pub fn validate_tax_rate(field: &str, value: Decimal) -> Result<(), BillingError> {
    if value < Decimal::ZERO || value > MAX_TAX_RATE {
        return Err(BillingError::validation(format!(
            "{field} must be between 0 and 100"
        )));
    }
    if !has_scale_at_most(value, MONEY_SCALE) {
        return Err(BillingError::validation(format!(
            "{field} must have at most 2 decimal places"
        )));
    }
    Ok(())
}

/// Validates document totals.
///
/// Every total must be a non-negative amount with at most two decimals,
/// except `adjustment` which may be negative.
pub fn validate_totals(totals: &DocumentTotals) -> Result<(), BillingError> {
    check_money("sub_total", totals.sub_total, false)?;
    check_money("discount_val", totals.discount_val, false)?;
    check_money("total_tax", totals.total_tax, false)?;
    check_money("adjustment", totals.adjustment, true)?;
    check_money("total_amount", totals.total_amount, false)?;
    Ok(())
}

/// Validates line items in order; the first failure names the item position.
pub fn validate_line_items(items: &[LineItem]) -> Result<(), BillingError> {
    for (index, item) in items.iter().enumerate() {
        let position = index + 1;
        if item.description.trim().is_empty() {
            return Err(BillingError::validation(format!(
                "item {position}: description is required"
            )));
        }
        validate_qty(&format!("item {position}: qty"), item.qty)?;
        validate_tax_rate(&format!("item {position}: tax"), item.tax)?;
        check_money(&format!("item {position}: rate"), item.rate, false)?;
        check_money(&format!("item {position}: amount"), item.amount, false)?;
    }
    Ok(())
}

/// Validates a whole document before it is written.
pub fn validate_document(totals: &DocumentTotals, items: &[LineItem]) -> Result<(), BillingError> {
    validate_totals(totals)?;
    validate_line_items(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_document_passes() {
        let totals = DocumentTotals {
            adjustment: dec!(-5.00),
            ..DocumentTotals::flat(dec!(495.00))
        };
        let items = vec![
            LineItem::new("Design", dec!(2), dec!(150)),
            LineItem::new("Build", dec!(1), dec!(200)).with_tax(dec!(10)),
        ];
        assert!(validate_document(&totals, &items).is_ok());
    }

    #[test]
    fn test_negative_total_rejected() {
        let totals = DocumentTotals::flat(dec!(-1));
        let err = validate_totals(&totals).unwrap_err();
        assert_eq!(err, BillingError::validation("sub_total cannot be negative"));
    }

    #[test]
    fn test_sub_cent_total_rejected() {
        let totals = DocumentTotals {
            total_amount: dec!(10.001),
            ..DocumentTotals::default()
        };
        assert!(matches!(
            validate_totals(&totals),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_description_names_position() {
        let items = vec![
            LineItem::new("Design", dec!(1), dec!(10)),
            LineItem::new("  ", dec!(1), dec!(10)),
        ];
        let err = validate_line_items(&items).unwrap_err();
        assert_eq!(
            err,
            BillingError::validation("item 2: description is required")
        );
    }

    #[test]
    fn test_tax_out_of_range_rejected() {
        let items = vec![LineItem::new("Design", dec!(1), dec!(10)).with_tax(dec!(101))];
        assert!(validate_line_items(&items).is_err());
    }

    #[test]
    fn test_empty_item_list_is_valid() {
        assert!(validate_line_items(&[]).is_ok());
    }

    #[test]
    fn test_limits_match_storage_columns() {
        assert_eq!(MAX_MONEY.to_string(), "9999999999999.99");
        assert_eq!(MAX_QTY.to_string(), "99999999999.9999");
    }

    #[test]
    fn test_values_beyond_column_precision_rejected() {
        let totals = DocumentTotals::flat(dec!(100000000000000.00));
        assert_eq!(
            validate_totals(&totals).unwrap_err(),
            BillingError::validation("sub_total exceeds the maximum of 9999999999999.99")
        );

        let fine_qty = vec![LineItem::new("x", dec!(1.23456), dec!(10))];
        assert_eq!(
            validate_line_items(&fine_qty).unwrap_err(),
            BillingError::validation("item 1: qty must have at most 4 decimal places")
        );

        let fine_tax = vec![LineItem::new("x", dec!(1), dec!(10)).with_tax(dec!(12.345))];
        assert_eq!(
            validate_line_items(&fine_tax).unwrap_err(),
            BillingError::validation("item 1: tax must have at most 2 decimal places")
        );
    }

    #[test]
    fn test_overflowing_qty_is_a_validation_error() {
        let qty: Decimal = "79228162514264337593543950335".parse().unwrap();
        let items = vec![LineItem::new("x", qty, dec!(2.00))];
        assert!(matches!(
            validate_line_items(&items),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn test_negative_adjustment_within_range_passes() {
        let totals = DocumentTotals {
            adjustment: -MAX_MONEY,
            ..DocumentTotals::default()
        };
        assert!(validate_totals(&totals).is_ok());

        let totals = DocumentTotals {
            adjustment: -MAX_MONEY - dec!(0.01),
            ..DocumentTotals::default()
        };
        assert!(validate_totals(&totals).is_err());
    }
}
