//! Stock balance arithmetic and reconciliation planning.
//!
//! The authoritative balance is one `product_stock` row per
//! (product, workspace); every change is mirrored by a `stock_movements`
//! ledger entry. This module holds the pure half of that subsystem:
//!
//! - Guarded balance arithmetic: a decrement that would drive the balance
//!   negative is rejected with [`StockError::InsufficientStock`] and has no
//!   effect
//! - Adjustment deltas for the set/add/remove stock-adjustment operations
//! - Reconciliation deltas for line-item quantity changes, keeping exactly
//!   one SALE movement aligned with each stock-tracked line item
//!
//! Products with stock tracking disabled bypass all of this; callers check
//! `track_stock` before consulting the ledger.

pub mod error;
pub mod ledger;
pub mod reconcile;
pub mod types;

#[cfg(test)]
mod ledger_props;

pub use error::StockError;
pub use ledger::{adjustment_delta, apply_decrement, apply_increment, has_sufficient_stock};
pub use reconcile::{reconcile_item_change, sale_movement_quantity, StockDelta};
pub use types::{AdjustmentType, MovementType};
