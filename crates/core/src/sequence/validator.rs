//! Candidate NCF validation.
//!
//! Decides whether a caller-supplied fiscal number may be assigned to a
//! document. This is a pure check: external state (the sequence registry and
//! the set of numbers already in use) is injected as closures, so the same
//! logic runs identically in unit tests and inside a database transaction.

use chrono::NaiveDate;

use super::error::SequenceError;
use super::types::{split_ncf, NcfSequence};

/// A successfully validated candidate number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedNcf {
    /// The sequence the number draws from.
    pub sequence: NcfSequence,
    /// The numeric value of the candidate.
    pub number: i64,
    /// The canonical zero-padded rendering, as stored on documents.
    pub canonical: String,
}

/// Validates a candidate fiscal number against its subtype sequence.
///
/// Check order:
/// 1. Format: 3-character prefix + up to 8 decimal digits.
/// 2. A sequence must exist for the prefix.
/// 3. The sequence must not be expired on `today`.
/// 4. The number must not exceed the sequence's upper bound.
/// 5. The number must not be below `next_number` - numbers are issued in
///    non-decreasing order per sequence, and gaps are never backfilled.
/// 6. No existing document may already use the canonical number. Uniqueness
///    is global across invoices and quotations, not scoped to a workspace;
///    the update path passes an `is_taken` that excludes the document being
///    updated so a number never collides with itself.
///
/// Does not mutate state. Callers that consume the number must persist
/// `sequence.advanced_to(number)` in the same transaction as the document
/// write.
pub fn validate_candidate<S, T>(
    candidate: &str,
    today: NaiveDate,
    find_sequence: S,
    is_taken: T,
) -> Result<ValidatedNcf, SequenceError>
where
    S: Fn(&str) -> Option<NcfSequence>,
    T: Fn(&str) -> bool,
{
    let (prefix, number) = split_ncf(candidate)?;

    let sequence =
        find_sequence(prefix).ok_or_else(|| SequenceError::PrefixNotFound(prefix.to_string()))?;

    if sequence.is_expired(today) {
        return Err(SequenceError::SequenceExpired {
            prefix: sequence.prefix.clone(),
            // is_expired only returns true when valid_until is set
            valid_until: sequence.valid_until.unwrap_or_default(),
        });
    }

    if sequence.is_exhausted(number) {
        return Err(SequenceError::SequenceExhausted {
            prefix: sequence.prefix.clone(),
            number,
            end_number: sequence.end_number.unwrap_or_default(),
        });
    }

    if number < sequence.next_number {
        return Err(SequenceError::BelowWatermark {
            candidate: number,
            next: sequence.next_number,
        });
    }

    let canonical = sequence.format(number);
    if is_taken(&canonical) {
        return Err(SequenceError::NumberInUse(canonical));
    }

    Ok(ValidatedNcf {
        sequence,
        number,
        canonical,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use facturo_shared::types::DocumentSubtypeId;

    use super::*;

    fn b01(next: i64) -> NcfSequence {
        NcfSequence {
            id: DocumentSubtypeId::new(),
            prefix: "B01".to_string(),
            start_number: 1,
            end_number: Some(100),
            next_number: next,
            valid_until: NaiveDate::from_ymd_opt(2026, 12, 31),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn registry(next: i64) -> impl Fn(&str) -> Option<NcfSequence> {
        move |prefix| (prefix == "B01").then(|| b01(next))
    }

    #[test]
    fn accepts_the_watermark_number() {
        let result =
            validate_candidate("B0100000005", today(), registry(5), |_| false).unwrap();
        assert_eq!(result.number, 5);
        assert_eq!(result.canonical, "B0100000005");
    }

    #[test]
    fn accepts_numbers_ahead_of_the_watermark() {
        let result = validate_candidate("B0100000042", today(), registry(5), |_| false).unwrap();
        assert_eq!(result.number, 42);
        assert_eq!(result.sequence.advanced_to(result.number), 43);
    }

    #[test]
    fn rejects_unknown_prefix() {
        let err = validate_candidate("B0500000001", today(), registry(1), |_| false).unwrap_err();
        assert_eq!(err, SequenceError::PrefixNotFound("B05".to_string()));
    }

    #[test]
    fn rejects_expired_sequence() {
        let past = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let err = validate_candidate("B0100000005", past, registry(5), |_| false).unwrap_err();
        assert!(matches!(err, SequenceError::SequenceExpired { .. }));
    }

    #[test]
    fn rejects_exhausted_sequence() {
        let err = validate_candidate("B0100000101", today(), registry(5), |_| false).unwrap_err();
        assert!(matches!(
            err,
            SequenceError::SequenceExhausted {
                number: 101,
                end_number: 100,
                ..
            }
        ));
    }

    #[test]
    fn rejects_numbers_below_the_watermark_even_if_unused() {
        let err = validate_candidate("B0100000003", today(), registry(5), |_| false).unwrap_err();
        assert_eq!(
            err,
            SequenceError::BelowWatermark {
                candidate: 3,
                next: 5
            }
        );
    }

    #[test]
    fn rejects_numbers_already_in_use() {
        let err =
            validate_candidate("B0100000005", today(), registry(5), |_| true).unwrap_err();
        assert_eq!(err, SequenceError::NumberInUse("B0100000005".to_string()));
    }

    #[test]
    fn uniqueness_is_checked_against_the_canonical_form() {
        // A short-form entry must collide with its padded rendering.
        let err = validate_candidate("B015", today(), registry(5), |taken| {
            taken == "B0100000005"
        })
        .unwrap_err();
        assert_eq!(err, SequenceError::NumberInUse("B0100000005".to_string()));
    }

    #[test]
    fn self_exclusion_is_the_callers_closure() {
        // Update path: the closure ignores the document's own number (P5).
        let own = "B0100000005";
        let result = validate_candidate(own, today(), registry(5), |taken| taken != own);
        assert!(result.is_ok());
    }

    #[test]
    fn format_errors_win_over_lookups() {
        let err = validate_candidate("XYZ", today(), registry(1), |_| true).unwrap_err();
        assert!(matches!(err, SequenceError::InvalidFormat(_)));
    }
}
