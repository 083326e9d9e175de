//! Server-side line and document totals.
//!
//! Line amounts are snapshotted at creation time: later tax- or
//! discount-rate changes never retroactively affect issued documents. The
//! caller may send a `total`, but it is ignored; every amount is recomputed
//! here so stored totals always equal the sum of their items.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::DocumentError;
use super::types::DocumentItemInput;

/// Monetary scale for all stored amounts.
const MONEY_DP: u32 = 2;

/// Computed amounts for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAmounts {
    /// `quantity * unit_price`.
    pub subtotal: Decimal,
    /// Absolute discount applied to the line.
    pub discount: Decimal,
    /// Absolute tax applied to the discounted base.
    pub tax: Decimal,
    /// `subtotal - discount + tax`.
    pub total: Decimal,
}

/// Document-level totals; each field equals the sum of its items' fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentTotals {
    /// Sum of line subtotals.
    pub subtotal_amount: Decimal,
    /// Sum of line discounts.
    pub discount_amount: Decimal,
    /// Sum of line taxes.
    pub tax_amount: Decimal,
    /// Sum of line totals.
    pub total_amount: Decimal,
}

fn round_money(amount: Decimal) -> Decimal {
    // Banker's rounding keeps repeated aggregation drift-free.
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointNearestEven)
}

/// Computes the amounts for a single line item.
///
/// Explicit amounts win over rates; a rate fills in a missing amount; both
/// absent means zero. The discount applies to the subtotal, tax applies to
/// the discounted base.
pub fn line_amounts(input: &DocumentItemInput) -> Result<LineAmounts, DocumentError> {
    input.validate()?;

    let subtotal = round_money(input.quantity * input.unit_price);

    let discount = match (input.discount_amount, input.discount_rate) {
        (Some(amount), _) => round_money(amount),
        (None, Some(rate)) => round_money(subtotal * rate / Decimal::ONE_HUNDRED),
        (None, None) => Decimal::ZERO,
    };
    if discount > subtotal {
        return Err(DocumentError::DiscountExceedsSubtotal { discount, subtotal });
    }

    let taxable = subtotal - discount;
    let tax = match (input.tax_amount, input.tax_rate) {
        (Some(amount), _) => round_money(amount),
        (None, Some(rate)) => round_money(taxable * rate / Decimal::ONE_HUNDRED),
        (None, None) => Decimal::ZERO,
    };

    Ok(LineAmounts {
        subtotal,
        discount,
        tax,
        total: taxable + tax,
    })
}

/// Sums line amounts into document totals.
#[must_use]
pub fn document_totals(lines: &[LineAmounts]) -> DocumentTotals {
    lines.iter().fold(DocumentTotals::default(), |acc, line| {
        DocumentTotals {
            subtotal_amount: acc.subtotal_amount + line.subtotal,
            discount_amount: acc.discount_amount + line.discount,
            tax_amount: acc.tax_amount + line.tax,
            total_amount: acc.total_amount + line.total,
        }
    })
}

#[cfg(test)]
mod tests {
    use facturo_shared::types::ProductId;
    use rust_decimal_macros::dec;

    use super::*;

    fn item() -> DocumentItemInput {
        DocumentItemInput {
            product_id: ProductId::new(),
            quantity: dec!(3),
            unit_price: dec!(100),
            discount_rate: None,
            discount_amount: None,
            tax_rate: None,
            tax_amount: None,
        }
    }

    #[test]
    fn plain_line_is_quantity_times_price() {
        let amounts = line_amounts(&item()).unwrap();
        assert_eq!(amounts.subtotal, dec!(300.00));
        assert_eq!(amounts.discount, dec!(0));
        assert_eq!(amounts.tax, dec!(0));
        assert_eq!(amounts.total, dec!(300.00));
    }

    #[test]
    fn itbis_rate_applies_to_discounted_base() {
        let mut input = item();
        input.discount_rate = Some(dec!(10));
        input.tax_rate = Some(dec!(18));
        let amounts = line_amounts(&input).unwrap();
        assert_eq!(amounts.subtotal, dec!(300.00));
        assert_eq!(amounts.discount, dec!(30.00));
        assert_eq!(amounts.tax, dec!(48.60)); // 18% of 270
        assert_eq!(amounts.total, dec!(318.60));
    }

    #[test]
    fn explicit_amounts_win_over_rates() {
        let mut input = item();
        input.discount_rate = Some(dec!(50));
        input.discount_amount = Some(dec!(25));
        input.tax_rate = Some(dec!(18));
        input.tax_amount = Some(dec!(10));
        let amounts = line_amounts(&input).unwrap();
        assert_eq!(amounts.discount, dec!(25));
        assert_eq!(amounts.tax, dec!(10));
        assert_eq!(amounts.total, dec!(285));
    }

    #[test]
    fn discount_may_not_exceed_the_line() {
        let mut input = item();
        input.discount_amount = Some(dec!(301));
        assert!(matches!(
            line_amounts(&input),
            Err(DocumentError::DiscountExceedsSubtotal { .. })
        ));
    }

    #[test]
    fn rounding_is_bankers() {
        let mut input = item();
        input.quantity = dec!(1);
        input.unit_price = dec!(0.125);
        let amounts = line_amounts(&input).unwrap();
        assert_eq!(amounts.subtotal, dec!(0.12));
    }

    #[test]
    fn document_totals_sum_each_column() {
        let a = line_amounts(&item()).unwrap();
        let mut taxed = item();
        taxed.tax_rate = Some(dec!(18));
        let b = line_amounts(&taxed).unwrap();

        let totals = document_totals(&[a, b]);
        assert_eq!(totals.subtotal_amount, dec!(600.00));
        assert_eq!(totals.tax_amount, dec!(54.00));
        assert_eq!(totals.total_amount, dec!(654.00));
        assert_eq!(
            totals.total_amount,
            totals.subtotal_amount - totals.discount_amount + totals.tax_amount
        );
    }
}
