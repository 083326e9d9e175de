//! Guarded stock balance arithmetic.
//!
//! These functions compute the new balance for a (product, workspace) pair
//! without touching storage. The repository layer fetches the current
//! balance under a row lock, applies one of these, and persists the result
//! together with its movement record in the same transaction.

use rust_decimal::Decimal;

use super::error::StockError;
use super::types::AdjustmentType;

/// Subtracts `quantity` from `balance`.
///
/// Fails with [`StockError::InsufficientStock`] when the balance would go
/// negative; the caller must treat a failure as "no side effect".
pub fn apply_decrement(balance: Decimal, quantity: Decimal) -> Result<Decimal, StockError> {
    if quantity <= Decimal::ZERO {
        return Err(StockError::InvalidQuantity(quantity));
    }
    if quantity > balance {
        return Err(StockError::InsufficientStock {
            requested: quantity,
            available: balance,
        });
    }
    Ok(balance - quantity)
}

/// Adds `quantity` to `balance`. There is no upper bound.
pub fn apply_increment(balance: Decimal, quantity: Decimal) -> Result<Decimal, StockError> {
    if quantity <= Decimal::ZERO {
        return Err(StockError::InvalidQuantity(quantity));
    }
    Ok(balance + quantity)
}

/// Read-only sufficiency check.
///
/// Products that do not track stock always report sufficient.
#[must_use]
pub fn has_sufficient_stock(track_stock: bool, balance: Decimal, quantity: Decimal) -> bool {
    !track_stock || quantity <= balance
}

/// Computes the signed delta a stock adjustment applies to the balance.
///
/// - `SetQuantity`: the delta between the target and the current balance;
///   the target must not be negative.
/// - `AddQuantity` / `RemoveQuantity`: direct deltas; removal may not exceed
///   the current balance.
pub fn adjustment_delta(
    adjustment_type: AdjustmentType,
    current: Decimal,
    quantity: Decimal,
) -> Result<Decimal, StockError> {
    match adjustment_type {
        AdjustmentType::SetQuantity => {
            if quantity < Decimal::ZERO {
                return Err(StockError::InvalidQuantity(quantity));
            }
            Ok(quantity - current)
        }
        AdjustmentType::AddQuantity => {
            if quantity <= Decimal::ZERO {
                return Err(StockError::InvalidQuantity(quantity));
            }
            Ok(quantity)
        }
        AdjustmentType::RemoveQuantity => {
            if quantity <= Decimal::ZERO {
                return Err(StockError::InvalidQuantity(quantity));
            }
            if quantity > current {
                return Err(StockError::InsufficientStock {
                    requested: quantity,
                    available: current,
                });
            }
            Ok(-quantity)
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn decrement_subtracts_within_balance() {
        assert_eq!(apply_decrement(dec!(5), dec!(3)).unwrap(), dec!(2));
        assert_eq!(apply_decrement(dec!(5), dec!(5)).unwrap(), dec!(0));
    }

    #[test]
    fn decrement_rejects_overdraw() {
        let err = apply_decrement(dec!(2), dec!(4)).unwrap_err();
        assert_eq!(
            err,
            StockError::InsufficientStock {
                requested: dec!(4),
                available: dec!(2)
            }
        );
    }

    #[test]
    fn decrement_rejects_non_positive_quantities() {
        assert!(apply_decrement(dec!(5), dec!(0)).is_err());
        assert!(apply_decrement(dec!(5), dec!(-1)).is_err());
    }

    #[test]
    fn increment_has_no_upper_bound() {
        assert_eq!(
            apply_increment(dec!(99999999), dec!(1)).unwrap(),
            dec!(100000000)
        );
    }

    #[test]
    fn untracked_products_always_have_stock() {
        assert!(has_sufficient_stock(false, dec!(0), dec!(1000)));
        assert!(!has_sufficient_stock(true, dec!(0), dec!(1000)));
        assert!(has_sufficient_stock(true, dec!(5), dec!(5)));
    }

    #[rstest]
    #[case(dec!(10), dec!(4), dec!(-6))]
    #[case(dec!(10), dec!(25), dec!(15))]
    // Setting to zero empties the shelf; it is not an overdraw.
    #[case(dec!(10), dec!(0), dec!(-10))]
    #[case(dec!(0), dec!(7), dec!(7))]
    fn set_quantity_computes_delta_against_current(
        #[case] current: Decimal,
        #[case] target: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(
            adjustment_delta(AdjustmentType::SetQuantity, current, target).unwrap(),
            expected
        );
    }

    #[test]
    fn remove_quantity_honors_the_guard() {
        assert_eq!(
            adjustment_delta(AdjustmentType::RemoveQuantity, dec!(10), dec!(4)).unwrap(),
            dec!(-4)
        );
        assert!(matches!(
            adjustment_delta(AdjustmentType::RemoveQuantity, dec!(3), dec!(4)),
            Err(StockError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn add_quantity_is_a_direct_delta() {
        assert_eq!(
            adjustment_delta(AdjustmentType::AddQuantity, dec!(10), dec!(4)).unwrap(),
            dec!(4)
        );
        assert!(adjustment_delta(AdjustmentType::AddQuantity, dec!(10), dec!(-4)).is_err());
    }
}
