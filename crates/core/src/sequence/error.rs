//! Error types for fiscal number allocation and validation.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while validating or allocating a fiscal number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// The candidate is not `3-char prefix + up to 8 decimal digits`.
    #[error("Invalid fiscal number format: {0}")]
    InvalidFormat(String),

    /// No sequence is configured for the candidate's prefix.
    #[error("No document subtype configured for prefix {0}")]
    PrefixNotFound(String),

    /// The sequence's validity window has passed.
    #[error("Sequence {prefix} expired on {valid_until}")]
    SequenceExpired {
        /// Sequence prefix.
        prefix: String,
        /// Last valid date of the sequence.
        valid_until: NaiveDate,
    },

    /// The number lies beyond the sequence's upper bound.
    #[error("Sequence {prefix} is exhausted: {number} exceeds {end_number}")]
    SequenceExhausted {
        /// Sequence prefix.
        prefix: String,
        /// The rejected number.
        number: i64,
        /// The sequence's inclusive upper bound.
        end_number: i64,
    },

    /// The number is below the sequence's high-water mark. Numbers must be
    /// issued in non-decreasing order; gaps are never backfilled.
    #[error("Number {candidate} is below the next available number {next}")]
    BelowWatermark {
        /// The rejected number.
        candidate: i64,
        /// The sequence's next number to allocate.
        next: i64,
    },

    /// Another document already carries this exact number.
    #[error("Fiscal number {0} is already in use")]
    NumberInUse(String),
}

impl SequenceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "INVALID_NCF_FORMAT",
            Self::PrefixNotFound(_) => "NCF_PREFIX_NOT_FOUND",
            Self::SequenceExpired { .. } => "SEQUENCE_EXPIRED",
            Self::SequenceExhausted { .. } => "SEQUENCE_EXHAUSTED",
            Self::BelowWatermark { .. } => "NCF_BELOW_WATERMARK",
            Self::NumberInUse(_) => "NCF_IN_USE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(
            SequenceError::InvalidFormat("x".into()).error_code(),
            "INVALID_NCF_FORMAT"
        );
        assert_eq!(
            SequenceError::BelowWatermark {
                candidate: 1,
                next: 5
            }
            .error_code(),
            "NCF_BELOW_WATERMARK"
        );
        assert_eq!(
            SequenceError::NumberInUse("B0100000001".into()).error_code(),
            "NCF_IN_USE"
        );
    }

    #[test]
    fn display_names_the_offending_number() {
        let err = SequenceError::SequenceExhausted {
            prefix: "B01".into(),
            number: 51,
            end_number: 50,
        };
        assert_eq!(
            err.to_string(),
            "Sequence B01 is exhausted: 51 exceeds 50"
        );
    }
}
