//! Line-item reconciliation planning.
//!
//! Every stock-tracked line item owns exactly one SALE movement. When the
//! item's quantity changes, the balance moves by the delta and the existing
//! movement is updated in place to `-new_quantity` - no compensating rows
//! are appended, so the movement count per item never exceeds one.

use rust_decimal::Decimal;

use super::error::StockError;

/// The stock effect of a line-item quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDelta {
    /// Quantity unchanged; no ledger effect.
    None,
    /// The item grew: consume this much more stock (requires sufficiency).
    Consume(Decimal),
    /// The item shrank: return this much stock to the shelf.
    Release(Decimal),
}

/// Computes the stock effect of editing a line item from `old_quantity` to
/// `new_quantity`.
///
/// Both quantities are item quantities (positive); the sign convention of
/// the movement row is handled by [`sale_movement_quantity`].
pub fn reconcile_item_change(
    old_quantity: Decimal,
    new_quantity: Decimal,
) -> Result<StockDelta, StockError> {
    if new_quantity <= Decimal::ZERO {
        return Err(StockError::InvalidQuantity(new_quantity));
    }

    let delta = new_quantity - old_quantity;
    if delta > Decimal::ZERO {
        Ok(StockDelta::Consume(delta))
    } else if delta < Decimal::ZERO {
        Ok(StockDelta::Release(-delta))
    } else {
        Ok(StockDelta::None)
    }
}

/// The signed quantity recorded on a SALE movement for an item of
/// `quantity`: outgoing stock is negative.
#[must_use]
pub fn sale_movement_quantity(quantity: Decimal) -> Decimal {
    -quantity
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn growing_an_item_consumes_the_delta() {
        assert_eq!(
            reconcile_item_change(dec!(3), dec!(7)).unwrap(),
            StockDelta::Consume(dec!(4))
        );
    }

    #[test]
    fn shrinking_an_item_releases_the_delta() {
        assert_eq!(
            reconcile_item_change(dec!(3), dec!(1)).unwrap(),
            StockDelta::Release(dec!(2))
        );
    }

    #[test]
    fn unchanged_quantity_is_a_no_op() {
        assert_eq!(
            reconcile_item_change(dec!(3), dec!(3)).unwrap(),
            StockDelta::None
        );
    }

    #[test]
    fn zero_or_negative_targets_are_rejected() {
        assert!(reconcile_item_change(dec!(3), dec!(0)).is_err());
        assert!(reconcile_item_change(dec!(3), dec!(-2)).is_err());
    }

    #[test]
    fn sale_movements_record_outgoing_stock_as_negative() {
        assert_eq!(sale_movement_quantity(dec!(3)), dec!(-3));
    }
}
