//! NCF sequence snapshot and number formatting.

use chrono::NaiveDate;
use facturo_shared::types::DocumentSubtypeId;
use serde::{Deserialize, Serialize};

use super::error::SequenceError;

/// Length of the NCF prefix (e.g. `B01`).
pub const NCF_PREFIX_LEN: usize = 3;

/// Width of the zero-padded numeric part of an NCF.
pub const NCF_NUMBER_LEN: usize = 8;

/// In-memory snapshot of a document subtype's numbering sequence.
///
/// The authoritative row lives in the database; repositories fetch it (under
/// a row lock on write paths) and hand this snapshot to the pure validation
/// and allocation logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NcfSequence {
    /// Subtype this sequence belongs to.
    pub id: DocumentSubtypeId,
    /// Fixed 3-character prefix, e.g. `B01`.
    pub prefix: String,
    /// First number of the range (inclusive).
    pub start_number: i64,
    /// Last number of the range (inclusive), if bounded.
    pub end_number: Option<i64>,
    /// The next number to allocate. Only ever increases.
    pub next_number: i64,
    /// Last date the sequence may issue numbers, if limited.
    pub valid_until: Option<NaiveDate>,
}

impl NcfSequence {
    /// Formats a number in this sequence's namespace.
    #[must_use]
    pub fn format(&self, number: i64) -> String {
        format_ncf(&self.prefix, number)
    }

    /// The formatted number the next allocation would return, without
    /// consuming it.
    #[must_use]
    pub fn peek_next(&self) -> String {
        self.format(self.next_number)
    }

    /// The counter value after `used` has been consumed:
    /// `max(next_number, used + 1)`.
    ///
    /// This supports both auto-generated numbers (`used == next_number`) and
    /// manually-entered numbers ahead of the watermark. The counter never
    /// moves backward.
    #[must_use]
    pub fn advanced_to(&self, used: i64) -> i64 {
        self.next_number.max(used + 1)
    }

    /// Returns true if the sequence may no longer issue numbers on `today`.
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.valid_until.is_some_and(|until| today > until)
    }

    /// Returns true if `number` lies beyond the sequence's upper bound.
    #[must_use]
    pub fn is_exhausted(&self, number: i64) -> bool {
        self.end_number.is_some_and(|end| number > end)
    }
}

/// Formats an NCF: `prefix` followed by `number` zero-padded to 8 digits.
#[must_use]
pub fn format_ncf(prefix: &str, number: i64) -> String {
    format!("{prefix}{number:0width$}", width = NCF_NUMBER_LEN)
}

/// Splits a candidate NCF into its prefix and numeric value.
///
/// The first 3 characters are the prefix; the remainder must be 1 to 8
/// decimal digits. Leading zeros are stripped by the numeric parse, so
/// `B0100000042` and `B0142` denote the same number.
pub fn split_ncf(candidate: &str) -> Result<(&str, i64), SequenceError> {
    let invalid = || SequenceError::InvalidFormat(candidate.to_string());

    if !candidate.is_ascii() || candidate.len() <= NCF_PREFIX_LEN {
        return Err(invalid());
    }

    let (prefix, digits) = candidate.split_at(NCF_PREFIX_LEN);
    if digits.len() > NCF_NUMBER_LEN || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let number: i64 = digits.parse().map_err(|_| invalid())?;
    Ok((prefix, number))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(next: i64) -> NcfSequence {
        NcfSequence {
            id: DocumentSubtypeId::new(),
            prefix: "B01".to_string(),
            start_number: 1,
            end_number: Some(50),
            next_number: next,
            valid_until: None,
        }
    }

    #[test]
    fn formats_with_eight_digit_padding() {
        assert_eq!(format_ncf("B01", 42), "B0100000042");
        assert_eq!(format_ncf("B02", 1), "B0200000001");
        assert_eq!(format_ncf("B01", 99_999_999), "B0199999999");
    }

    #[test]
    fn peek_does_not_advance() {
        let seq = sequence(1);
        assert_eq!(seq.peek_next(), "B0100000001");
        assert_eq!(seq.next_number, 1);
    }

    #[test]
    fn advanced_to_takes_the_maximum() {
        let seq = sequence(5);
        // Consuming the watermark number bumps by one.
        assert_eq!(seq.advanced_to(5), 6);
        // Consuming ahead of the watermark jumps the counter.
        assert_eq!(seq.advanced_to(12), 13);
        // Consuming behind it never moves the counter backward.
        assert_eq!(seq.advanced_to(2), 5);
    }

    #[test]
    fn split_accepts_padded_and_short_numbers() {
        assert_eq!(split_ncf("B0100000042").unwrap(), ("B01", 42));
        assert_eq!(split_ncf("B0142").unwrap(), ("B01", 42));
    }

    #[test]
    fn split_rejects_malformed_candidates() {
        for bad in ["", "B0", "B01", "B01x42", "B01123456789", "B01 42"] {
            assert!(matches!(
                split_ncf(bad),
                Err(SequenceError::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn expiry_is_inclusive_of_the_last_day() {
        let mut seq = sequence(1);
        seq.valid_until = NaiveDate::from_ymd_opt(2026, 12, 31);
        assert!(!seq.is_expired(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()));
        assert!(seq.is_expired(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()));
    }

    #[test]
    fn exhaustion_checks_the_upper_bound() {
        let seq = sequence(1);
        assert!(!seq.is_exhausted(50));
        assert!(seq.is_exhausted(51));

        let unbounded = NcfSequence {
            end_number: None,
            ..sequence(1)
        };
        assert!(!unbounded.is_exhausted(i64::MAX));
    }
}
