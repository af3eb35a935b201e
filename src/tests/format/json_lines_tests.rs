//! Tests for the JSON lines format.

use crate::format::{JsonLinesFormat, LineFormat};
use crate::record::Record;

#[test]
fn formats_fields_in_declaration_order() {
    let line = JsonLinesFormat
        .format(&Record::new(2, "B", "Y", "1991-02-02"))
        .unwrap();
    assert_eq!(
        line,
        r#"{"id":2,"firstName":"B","lastName":"Y","birthdate":"1991-02-02"}"#
    );
}

#[test]
fn parse_reverses_format_even_for_awkward_text() {
    let records = [
        Record::new(1, "A", "X", "1990-01-01"),
        Record::new(-5, "", "", ""),
        Record::new(i64::MAX, "quote \" here", "line\nbreak", "tab\tand ünïcode"),
    ];
    for record in records {
        let line = JsonLinesFormat.format(&record).unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(JsonLinesFormat.parse(&line).unwrap(), record);
    }
}

#[test]
fn rejects_lines_without_an_id() {
    assert!(JsonLinesFormat.parse(r#"{"firstName":"A"}"#).is_err());
}
