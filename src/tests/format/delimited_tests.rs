//! Tests for the delimited format.

use crate::format::{DelimitedFormat, FormatError, LineFormat};
use crate::record::Record;

#[test]
fn plain_fields_are_joined_by_the_delimiter() {
    let fmt = DelimitedFormat::default();
    let line = fmt.format(&Record::new(1, "A", "X", "1990-01-01")).unwrap();
    assert_eq!(line, "1,A,X,1990-01-01");
}

#[test]
fn custom_delimiter_is_used() {
    let fmt = DelimitedFormat::new('|').unwrap();
    assert_eq!(fmt.delimiter(), '|');
    let line = fmt.format(&Record::new(3, "C", "Z", "")).unwrap();
    assert_eq!(line, "3|C|Z|");
}

#[test]
fn fields_holding_the_delimiter_are_quoted_and_parse_back() {
    let fmt = DelimitedFormat::default();
    let record = Record::new(4, "Smith, Jr.", "say \"hi\"", "multi\nline");
    let line = fmt.format(&record).unwrap();
    assert!(line.starts_with("4,\"Smith, Jr.\""));
    assert_eq!(fmt.parse(&line).unwrap(), record);
}

#[test]
fn round_trips_empty_and_whitespace_fields() {
    let fmt = DelimitedFormat::new(';').unwrap();
    for record in [
        Record::new(0, "", "", ""),
        Record::new(-9, " padded ", "x", " "),
    ] {
        let line = fmt.format(&record).unwrap();
        assert_eq!(fmt.parse(&line).unwrap(), record);
    }
}

#[test]
fn wrong_field_count_is_malformed() {
    let fmt = DelimitedFormat::default();
    assert!(matches!(fmt.parse("1,A,X"), Err(FormatError::Malformed(_))));
    assert!(matches!(fmt.parse("x,A,X,B"), Err(FormatError::Malformed(_))));
}

#[test]
fn quote_and_non_ascii_delimiters_are_rejected() {
    assert!(matches!(
        DelimitedFormat::new('"'),
        Err(FormatError::InvalidDelimiter('"'))
    ));
    assert!(DelimitedFormat::new('€').is_err());
}
