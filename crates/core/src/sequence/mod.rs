//! Fiscal document numbering (NCF).
//!
//! An NCF (Número de Comprobante Fiscal) is a formatted, sequential,
//! subtype-scoped identifier mandatory on Dominican Republic fiscal
//! documents. Each document subtype owns a numbering sequence: a 3-character
//! prefix plus a monotonically increasing counter, rendered as
//! `prefix + zero-padded 8-digit number` (e.g. `B0100000042`).
//!
//! This module implements:
//! - Number formatting and parsing
//! - The watermark arithmetic: `next_number` only ever increases and is
//!   advanced to `max(next_number, used + 1)` when a number is consumed
//! - Candidate validation for caller-supplied numbers
//!
//! Persistence and row locking live in `facturo-db`; callers fetch the
//! sequence state, run the pure checks here, and persist the advanced
//! counter inside the same database transaction as the document write.

pub mod error;
pub mod types;
pub mod validator;

#[cfg(test)]
mod validator_props;

pub use error::SequenceError;
pub use types::{format_ncf, split_ncf, NcfSequence, NCF_NUMBER_LEN, NCF_PREFIX_LEN};
pub use validator::{validate_candidate, ValidatedNcf};
