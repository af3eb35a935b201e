//! Tests for the in-memory table.

use crate::record::{RawRow, Row, Value};
use crate::source::{DataSource, InMemoryTable, PageQuery};

fn ids(rows: &[RawRow]) -> Vec<Option<i64>> {
    rows.iter()
        .map(|r| r.get("id").and_then(Value::as_i64))
        .collect()
}

#[test]
fn pages_are_sorted_descending_and_bounded() {
    let table = InMemoryTable::customers(
        "customer",
        &[(3, "c", "c", ""), (1, "a", "a", ""), (5, "e", "e", ""), (2, "b", "b", "")],
    );
    let page = table.fetch_page(&PageQuery::customer("customer", 3)).unwrap();
    assert_eq!(ids(&page), vec![Some(5), Some(3), Some(2)]);
}

#[test]
fn cursor_selects_rows_strictly_after_it() {
    let table = InMemoryTable::customers(
        "customer",
        &[(3, "c", "c", ""), (1, "a", "a", ""), (5, "e", "e", ""), (2, "b", "b", "")],
    );
    let query = PageQuery::customer("customer", 10).continue_after(3);
    let page = table.fetch_page(&query).unwrap();
    assert_eq!(ids(&page), vec![Some(2), Some(1)]);
}

#[test]
fn rows_without_integer_id_sort_last_and_never_match_a_cursor() {
    let table = InMemoryTable::new(
        "customer",
        vec![
            RawRow::new().with("id", Value::Null),
            RawRow::customer(1, "a", "a", ""),
            RawRow::customer(2, "b", "b", ""),
        ],
    );
    let first = table.fetch_page(&PageQuery::customer("customer", 10)).unwrap();
    assert_eq!(ids(&first), vec![Some(2), Some(1), None]);

    let continued = table
        .fetch_page(&PageQuery::customer("customer", 10).continue_after(2))
        .unwrap();
    assert_eq!(ids(&continued), vec![Some(1)]);
}

#[test]
fn clones_share_rows() {
    let table = InMemoryTable::customers("customer", &[]);
    assert!(table.is_empty());
    let handle = table.clone();
    handle.insert(RawRow::customer(9, "i", "i", ""));
    assert_eq!(table.len(), 1);
}
