//! Unit tests for the pure helpers of the document repository.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use facturo_core::document::{DocumentKind as CoreKind, DocumentStatus as CoreStatus};

use crate::entities::document_items;
use crate::repositories::document::{
    existing_from_row, input_from_row, totals_from_rows, validate_assignable_status,
};

fn item_row(quantity: Decimal) -> document_items::Model {
    let now = Utc::now().into();
    document_items::Model {
        id: Uuid::new_v4(),
        document_id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        quantity,
        unit_price: dec!(100),
        discount_rate: dec!(0),
        discount_amount: dec!(10),
        tax_rate: dec!(18),
        tax_amount: dec!(18),
        total: quantity * dec!(100) - dec!(10) + dec!(18),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn direct_statuses_are_assignable() {
    for status in [CoreStatus::Draft, CoreStatus::Pending, CoreStatus::Cancelled] {
        assert!(validate_assignable_status(status, CoreKind::Invoice, "create").is_ok());
        assert!(validate_assignable_status(status, CoreKind::Quotation, "create").is_ok());
    }
    assert!(validate_assignable_status(CoreStatus::Paid, CoreKind::Invoice, "create").is_ok());
}

#[test]
fn lifecycle_statuses_are_not_assignable() {
    assert!(validate_assignable_status(CoreStatus::Converted, CoreKind::Quotation, "assign")
        .is_err());
    assert!(validate_assignable_status(CoreStatus::Deleted, CoreKind::Invoice, "assign").is_err());
    // Paid quotations do not exist.
    assert!(validate_assignable_status(CoreStatus::Paid, CoreKind::Quotation, "assign").is_err());
}

#[test]
fn totals_sum_every_column() {
    let rows = vec![item_row(dec!(2)), item_row(dec!(3))];
    let totals = totals_from_rows(&rows);
    assert_eq!(totals.subtotal_amount, dec!(500));
    assert_eq!(totals.discount_amount, dec!(20));
    assert_eq!(totals.tax_amount, dec!(36));
    assert_eq!(totals.total_amount, dec!(516));
    assert_eq!(
        totals.total_amount,
        totals.subtotal_amount - totals.discount_amount + totals.tax_amount
    );
}

/// Strategy for line quantities with up to 2 decimal places.
fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Stored document totals must always equal the sum of their items.
    #[test]
    fn totals_equal_the_sum_of_their_rows(
        quantities in prop::collection::vec(quantity_strategy(), 1..10)
    ) {
        let rows: Vec<_> = quantities.iter().map(|q| item_row(*q)).collect();
        let totals = totals_from_rows(&rows);

        let expected_total: Decimal = rows.iter().map(|row| row.total).sum();
        prop_assert_eq!(totals.total_amount, expected_total);
        prop_assert_eq!(
            totals.total_amount,
            totals.subtotal_amount - totals.discount_amount + totals.tax_amount
        );
    }
}

#[test]
fn row_round_trips_through_input() {
    let row = item_row(dec!(2));
    let input = input_from_row(&row);
    assert_eq!(input.quantity, row.quantity);
    assert_eq!(input.unit_price, row.unit_price);
    assert_eq!(input.discount_amount, Some(row.discount_amount));
    assert_eq!(input.tax_amount, Some(row.tax_amount));

    let existing = existing_from_row(&row);
    assert_eq!(existing.id.into_inner(), row.id);
    assert_eq!(existing.product_id.into_inner(), row.product_id);
    assert_eq!(existing.quantity, row.quantity);
}
