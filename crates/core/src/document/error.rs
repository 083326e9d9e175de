//! Error types for document operations.

use rust_decimal::Decimal;
use thiserror::Error;

use facturo_shared::types::DocumentItemId;

use super::types::{DocumentKind, DocumentStatus};

/// Errors that can occur while validating document input or state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// A document must carry at least one line item.
    #[error("Document must have at least one line item")]
    EmptyItems,

    /// Line quantity must be positive.
    #[error("Line quantity must be positive, got {0}")]
    InvalidQuantity(Decimal),

    /// A monetary field must not be negative.
    #[error("{field} must not be negative")]
    NegativeAmount {
        /// The offending field.
        field: &'static str,
    },

    /// A percentage rate lies outside 0..=100.
    #[error("{field} must be between 0 and 100, got {rate}")]
    InvalidRate {
        /// The offending field.
        field: &'static str,
        /// The rejected rate.
        rate: Decimal,
    },

    /// Line discount exceeds the line subtotal.
    #[error("Discount {discount} exceeds line subtotal {subtotal}")]
    DiscountExceedsSubtotal {
        /// Discount amount.
        discount: Decimal,
        /// Line subtotal.
        subtotal: Decimal,
    },

    /// An update referenced a line item the document does not have.
    #[error("Unknown line item: {0}")]
    UnknownItem(DocumentItemId),

    /// An update referenced the same line item twice.
    #[error("Duplicate line item in submission: {0}")]
    DuplicateItem(DocumentItemId),

    /// The document's status does not permit the attempted action.
    #[error("Cannot {action} a document in status {status}")]
    InvalidStatus {
        /// Current document status.
        status: DocumentStatus,
        /// The attempted action.
        action: &'static str,
    },

    /// The operation requires a different document kind (e.g. converting an
    /// invoice).
    #[error("Operation requires kind {expected}, got {actual}")]
    KindMismatch {
        /// Kind the operation requires.
        expected: DocumentKind,
        /// Kind actually found.
        actual: DocumentKind,
    },

    /// The status is not valid for the document kind (e.g. a paid
    /// quotation).
    #[error("Status {status} is not valid for a {kind}")]
    StatusNotAllowedForKind {
        /// The rejected status.
        status: DocumentStatus,
        /// The document kind.
        kind: DocumentKind,
    },
}

impl DocumentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyItems => "EMPTY_ITEMS",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::InvalidRate { .. } => "INVALID_RATE",
            Self::DiscountExceedsSubtotal { .. } => "DISCOUNT_EXCEEDS_SUBTOTAL",
            Self::UnknownItem(_) => "UNKNOWN_ITEM",
            Self::DuplicateItem(_) => "DUPLICATE_ITEM",
            Self::InvalidStatus { .. } => "INVALID_STATUS",
            Self::KindMismatch { .. } => "KIND_MISMATCH",
            Self::StatusNotAllowedForKind { .. } => "STATUS_NOT_ALLOWED_FOR_KIND",
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(DocumentError::EmptyItems.error_code(), "EMPTY_ITEMS");
        assert_eq!(
            DocumentError::InvalidQuantity(dec!(0)).error_code(),
            "INVALID_QUANTITY"
        );
        assert_eq!(
            DocumentError::InvalidStatus {
                status: DocumentStatus::Deleted,
                action: "update"
            }
            .error_code(),
            "INVALID_STATUS"
        );
    }

    #[test]
    fn display_reads_naturally() {
        let err = DocumentError::KindMismatch {
            expected: DocumentKind::Quotation,
            actual: DocumentKind::Invoice,
        };
        assert_eq!(err.to_string(), "Operation requires kind quotation, got invoice");
    }
}
