//! Error types for stock operations.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during stock ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// The operation would drive a stock balance negative.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Quantity the operation needed.
        requested: Decimal,
        /// Quantity actually on hand.
        available: Decimal,
    },

    /// The supplied quantity is not valid for the operation (zero, negative,
    /// or negative target balance).
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(Decimal),

    /// A transfer names the same workspace as source and destination.
    #[error("Transfer source and destination workspaces must differ")]
    SameWorkspace,
}

impl StockError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::SameWorkspace => "SAME_WORKSPACE_TRANSFER",
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(
            StockError::InsufficientStock {
                requested: dec!(4),
                available: dec!(2)
            }
            .error_code(),
            "INSUFFICIENT_STOCK"
        );
        assert_eq!(
            StockError::InvalidQuantity(dec!(-1)).error_code(),
            "INVALID_QUANTITY"
        );
        assert_eq!(StockError::SameWorkspace.error_code(), "SAME_WORKSPACE_TRANSFER");
    }

    #[test]
    fn insufficient_stock_names_the_shortfall() {
        let err = StockError::InsufficientStock {
            requested: dec!(4),
            available: dec!(2),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock: requested 4, available 2"
        );
    }
}
