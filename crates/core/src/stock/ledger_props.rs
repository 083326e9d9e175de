//! Property-based tests for stock balance arithmetic.
//!
//! - No negative stock: no sequence of guarded operations ever observes a
//!   balance below zero, and rejected operations leave the balance unchanged
//! - Reconciliation deltas are conservative: consume followed by the
//!   mirroring release restores the original balance

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::ledger::{adjustment_delta, apply_decrement, apply_increment};
use super::reconcile::{reconcile_item_change, StockDelta};
use super::types::AdjustmentType;

/// Strategy for quantities with up to 2 decimal places, 0.01 to 10,000.00.
fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// A random guarded operation.
#[derive(Debug, Clone)]
enum Op {
    Increment(Decimal),
    Decrement(Decimal),
    Adjust(AdjustmentType, Decimal),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        quantity().prop_map(Op::Increment),
        quantity().prop_map(Op::Decrement),
        quantity().prop_map(|q| Op::Adjust(AdjustmentType::SetQuantity, q)),
        quantity().prop_map(|q| Op::Adjust(AdjustmentType::AddQuantity, q)),
        quantity().prop_map(|q| Op::Adjust(AdjustmentType::RemoveQuantity, q)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn balance_never_goes_negative(start in quantity(), ops in prop::collection::vec(op(), 1..40)) {
        let mut balance = start;
        for operation in ops {
            let result = match operation {
                Op::Increment(q) => apply_increment(balance, q),
                Op::Decrement(q) => apply_decrement(balance, q),
                Op::Adjust(kind, q) => {
                    adjustment_delta(kind, balance, q).map(|delta| balance + delta)
                }
            };
            match result {
                Ok(next) => {
                    prop_assert!(next >= Decimal::ZERO);
                    balance = next;
                }
                // Rejected operations must leave the balance untouched.
                Err(_) => prop_assert!(balance >= Decimal::ZERO),
            }
        }
    }

    #[test]
    fn decrement_then_increment_round_trips(balance in quantity(), qty in quantity()) {
        prop_assume!(qty <= balance);
        let after = apply_decrement(balance, qty).unwrap();
        prop_assert_eq!(apply_increment(after, qty).unwrap(), balance);
    }

    #[test]
    fn reconcile_deltas_are_conservative(old_qty in quantity(), new_qty in quantity()) {
        let balance = Decimal::new(100_000_000, 2); // plenty of headroom
        let forward = reconcile_item_change(old_qty, new_qty).unwrap();
        let backward = reconcile_item_change(new_qty, old_qty).unwrap();

        let apply = |balance: Decimal, delta: StockDelta| match delta {
            StockDelta::None => Ok(balance),
            StockDelta::Consume(q) => apply_decrement(balance, q),
            StockDelta::Release(q) => apply_increment(balance, q),
        };

        let there = apply(balance, forward).unwrap();
        let back = apply(there, backward).unwrap();
        prop_assert_eq!(back, balance);
    }

    #[test]
    fn set_quantity_lands_exactly_on_target(current in quantity(), target in quantity()) {
        let delta = adjustment_delta(AdjustmentType::SetQuantity, current, target).unwrap();
        prop_assert_eq!(current + delta, target);
    }
}
