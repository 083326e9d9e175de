//! Property-based tests for NCF formatting and validation.
//!
//! - Monotonic numbering: the advanced counter is always strictly greater
//!   than the consumed number and never below the previous counter
//! - Format/parse round-trip over the full number domain
//! - The validator never accepts a number below the watermark

use chrono::NaiveDate;
use proptest::prelude::*;

use facturo_shared::types::DocumentSubtypeId;

use super::types::{format_ncf, split_ncf, NcfSequence};
use super::validator::validate_candidate;

fn sequence(next: i64, end: Option<i64>) -> NcfSequence {
    NcfSequence {
        id: DocumentSubtypeId::new(),
        prefix: "B01".to_string(),
        start_number: 1,
        end_number: end,
        next_number: next,
        valid_until: None,
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn format_parse_round_trip(number in 0i64..=99_999_999) {
        let rendered = format_ncf("B01", number);
        prop_assert_eq!(rendered.len(), 11);
        let (prefix, parsed) = split_ncf(&rendered).unwrap();
        prop_assert_eq!(prefix, "B01");
        prop_assert_eq!(parsed, number);
    }

    #[test]
    fn advanced_counter_is_monotonic(next in 1i64..=1_000_000, used in 1i64..=1_000_000) {
        let seq = sequence(next, None);
        let advanced = seq.advanced_to(used);
        // Never moves backward, and always clears the consumed number.
        prop_assert!(advanced >= next);
        prop_assert!(advanced > used || used < next);
    }

    #[test]
    fn repeated_consumption_yields_distinct_numbers(start in 1i64..=1_000, count in 1usize..=50) {
        let mut seq = sequence(start, None);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..count {
            let number = seq.next_number;
            prop_assert!(seen.insert(number));
            seq.next_number = seq.advanced_to(number);
        }
        prop_assert_eq!(seq.next_number, start + count as i64);
    }

    #[test]
    fn validator_never_accepts_below_watermark(next in 2i64..=1_000_000, candidate in 1i64..=1_000_000) {
        prop_assume!(candidate < next);
        let rendered = format_ncf("B01", candidate);
        let result = validate_candidate(
            &rendered,
            today(),
            |prefix| (prefix == "B01").then(|| sequence(next, None)),
            |_| false,
        );
        prop_assert!(result.is_err());
    }

    #[test]
    fn validator_accepts_any_free_number_at_or_above_watermark(
        next in 1i64..=1_000_000,
        ahead in 0i64..=1_000,
    ) {
        let candidate = next + ahead;
        let rendered = format_ncf("B01", candidate);
        let result = validate_candidate(
            &rendered,
            today(),
            |prefix| (prefix == "B01").then(|| sequence(next, None)),
            |_| false,
        );
        prop_assert!(result.is_ok());
    }
}
