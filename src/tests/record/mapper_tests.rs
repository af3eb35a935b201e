//! Tests for mapping raw rows into records.

use crate::error::BatchError;
use crate::record::{CustomerRowMapper, RawRow, Record, RowMapper, Value};

#[test]
fn maps_a_complete_customer_row() {
    let row = RawRow::customer(7, "Ada", "Lovelace", "1815-12-10");
    let record = CustomerRowMapper.map_row(&row, 0).unwrap();
    assert_eq!(record, Record::new(7, "Ada", "Lovelace", "1815-12-10"));
}

#[test]
fn column_lookup_ignores_case() {
    let row = RawRow::new()
        .with("ID", 3_i64)
        .with("FIRSTNAME", "A")
        .with("lastname", "B")
        .with("BirthDate", "C");
    let record = CustomerRowMapper.map_row(&row, 0).unwrap();
    assert_eq!(record, Record::new(3, "A", "B", "C"));
}

#[test]
fn integer_text_id_is_accepted() {
    let row = RawRow::new().with("id", " 42 ");
    let record = CustomerRowMapper.map_row(&row, 0).unwrap();
    assert_eq!(record.id(), 42);
}

#[test]
fn missing_optional_fields_default_to_empty() {
    let row = RawRow::new().with("id", 1_i64).with("lastName", Value::Null);
    let record = CustomerRowMapper.map_row(&row, 0).unwrap();
    assert_eq!(record.first_name(), "");
    assert_eq!(record.last_name(), "");
    assert_eq!(record.birthdate(), "");
}

#[test]
fn missing_id_is_a_mapping_error() {
    let row = RawRow::new().with("firstName", "A");
    let err = CustomerRowMapper.map_row(&row, 5).unwrap_err();
    match err {
        BatchError::Mapping { row, reason } => {
            assert_eq!(row, 5);
            assert!(reason.contains("missing"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn null_id_is_a_mapping_error() {
    let row = RawRow::new().with("id", Value::Null);
    assert!(matches!(
        CustomerRowMapper.map_row(&row, 0),
        Err(BatchError::Mapping { .. })
    ));
}

#[test]
fn non_integer_id_is_a_mapping_error() {
    for bad in [Value::Text("abc".into()), Value::Real(1.5)] {
        let row = RawRow::new().with("id", bad);
        assert!(matches!(
            CustomerRowMapper.map_row(&row, 0),
            Err(BatchError::Mapping { .. })
        ));
    }
}

#[test]
fn numeric_fields_are_rendered_as_text() {
    let row = RawRow::new().with("id", 1_i64).with("birthdate", 19900101_i64);
    let record = CustomerRowMapper.map_row(&row, 0).unwrap();
    assert_eq!(record.birthdate(), "19900101");
}
