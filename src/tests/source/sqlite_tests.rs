//! Tests for the SQLite data source.

use crate::record::{Row, Value};
use crate::source::{DataSource, PageQuery, SourceError, SqliteSource};

fn seeded(n: i64) -> SqliteSource {
    let source = SqliteSource::in_memory().unwrap();
    for id in 1..=n {
        source
            .insert_customer(id, &format!("f{id}"), &format!("l{id}"), "1999-09-09")
            .unwrap();
    }
    source
}

#[test]
fn fetches_first_page_in_descending_order() {
    let source = seeded(5);
    let page = source
        .fetch_page(&PageQuery::customer("customer", 2))
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].get("id"), Some(&Value::Integer(5)));
    assert_eq!(page[1].get("id"), Some(&Value::Integer(4)));
    assert_eq!(page[0].get("firstName"), Some(&Value::Text("f5".into())));
}

#[test]
fn binds_the_cursor_for_continued_pages() {
    let source = seeded(5);
    let query = PageQuery::customer("customer", 10).continue_after(3);
    let page = source.fetch_page(&query).unwrap();
    let ids: Vec<_> = page.iter().map(|r| r.get("id").cloned()).collect();
    assert_eq!(
        ids,
        vec![Some(Value::Integer(2)), Some(Value::Integer(1))]
    );
}

#[test]
fn missing_table_is_a_query_error() {
    let source = SqliteSource::in_memory().unwrap();
    let err = source
        .fetch_page(&PageQuery::customer("no_such_table", 10))
        .unwrap_err();
    match err {
        SourceError::Query { sql, .. } => assert!(sql.contains("no_such_table")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn null_columns_come_back_as_null() {
    let source = SqliteSource::in_memory().unwrap();
    source
        .execute_batch("INSERT INTO customer (id, firstName) VALUES (1, NULL);")
        .unwrap();
    let page = source
        .fetch_page(&PageQuery::customer("customer", 10))
        .unwrap();
    assert_eq!(page[0].get("firstName"), Some(&Value::Null));
    assert_eq!(page[0].get("birthdate"), Some(&Value::Null));
}
