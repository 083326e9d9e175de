//! Fiscal document domain types and calculations.
//!
//! A fiscal document is either an invoice or a quotation; both share one
//! shape, one numbering namespace, and one line-item model. This module
//! holds:
//!
//! - Document kinds and the status machine
//! - Line-item input validation and server-side amount computation (the
//!   caller's `total` is never trusted)
//! - The identity-keyed item diff that drives the update path

pub mod diff;
pub mod error;
pub mod totals;
pub mod types;

pub use diff::{diff_items, ExistingItem, ItemDiff, ItemUpdate};
pub use error::DocumentError;
pub use totals::{document_totals, line_amounts, DocumentTotals, LineAmounts};
pub use types::{DocumentItemInput, DocumentKind, DocumentStatus, SubmittedItem};
