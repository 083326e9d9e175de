//! Core business logic for Facturo.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and calculations live
//! here. Persistence and locking are the `facturo-db` crate's job; this crate
//! receives already-fetched state and returns decisions.
//!
//! # Modules
//!
//! - `sequence` - Fiscal document (NCF) numbering: formatting, watermark
//!   arithmetic, candidate validation
//! - `stock` - Stock balance arithmetic and line-item reconciliation planning
//! - `document` - Fiscal document kinds, statuses, totals, and item diffing

pub mod document;
pub mod sequence;
pub mod stock;
