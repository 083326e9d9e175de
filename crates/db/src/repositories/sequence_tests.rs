//! Unit tests for the pure helpers of the sequence repository.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::entities::document_subtypes;
use crate::repositories::sequence::{
    normalize_prefix, subtype_snapshot, SequenceRepository, SubtypeError,
};

fn subtype(next_number: i64, valid_until: Option<NaiveDate>) -> document_subtypes::Model {
    let now = Utc::now().into();
    document_subtypes::Model {
        id: Uuid::new_v4(),
        name: "B01 - Factura de Crédito Fiscal".to_string(),
        prefix: "B01".to_string(),
        start_number: 1,
        end_number: Some(100),
        next_number,
        valid_until_date: valid_until,
        is_default: true,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn prefix_is_normalized_to_uppercase() {
    assert_eq!(normalize_prefix("b01").unwrap(), "B01");
    assert_eq!(normalize_prefix(" B02 ").unwrap(), "B02");
}

#[test]
fn prefix_must_be_three_alphanumerics() {
    for bad in ["", "B", "B0", "B012", "B-1", "B 1"] {
        assert!(matches!(
            normalize_prefix(bad),
            Err(SubtypeError::InvalidPrefix(_))
        ));
    }
}

#[test]
fn snapshot_mirrors_the_row() {
    let model = subtype(7, None);
    let snapshot = subtype_snapshot(&model);
    assert_eq!(snapshot.prefix, "B01");
    assert_eq!(snapshot.next_number, 7);
    assert_eq!(snapshot.end_number, Some(100));
    assert_eq!(snapshot.peek_next(), "B0100000007");
}

#[test]
fn peek_allocation_returns_the_formatted_watermark() {
    let model = subtype(42, None);
    let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
    let (canonical, number) = SequenceRepository::peek_allocation(&model, today).unwrap();
    assert_eq!(canonical, "B0100000042");
    assert_eq!(number, 42);
}

#[test]
fn peek_allocation_rejects_expired_sequences() {
    let model = subtype(42, NaiveDate::from_ymd_opt(2025, 12, 31));
    let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    assert!(matches!(
        SequenceRepository::peek_allocation(&model, today),
        Err(SubtypeError::Sequence(_))
    ));
}

#[test]
fn peek_allocation_rejects_exhausted_sequences() {
    let model = subtype(101, None);
    let today = NaiveDate::from_ymd_opt(2026, 6, 15).unwrap();
    assert!(matches!(
        SequenceRepository::peek_allocation(&model, today),
        Err(SubtypeError::Sequence(_))
    ));
}
