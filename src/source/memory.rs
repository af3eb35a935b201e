//! In-memory table for testing.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

use super::{DataSource, PageQuery, SortOrder, SourceError};
use crate::record::{RawRow, Row};

/// In-memory table answering page queries by evaluating them directly.
///
/// Clones share the same rows, so a test can keep a handle and mutate the
/// table between runs.
#[derive(Debug, Clone)]
pub struct InMemoryTable {
    id: String,
    rows: Arc<Mutex<Vec<RawRow>>>,
}

impl InMemoryTable {
    /// Create a new table with the given rows.
    pub fn new(id: impl Into<String>, rows: Vec<RawRow>) -> Self {
        Self {
            id: id.into(),
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    /// Create a `customer` table from `(id, firstName, lastName, birthdate)` tuples.
    pub fn customers(id: impl Into<String>, rows: &[(i64, &str, &str, &str)]) -> Self {
        let rows = rows
            .iter()
            .map(|(id, first, last, birth)| RawRow::customer(*id, first, last, birth))
            .collect();
        Self::new(id, rows)
    }

    pub fn insert(&self, row: RawRow) {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row);
    }

    pub fn len(&self) -> usize {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rows without an integer key sort like SQL NULLs: below every integer.
fn compare_keys(a: Option<i64>, b: Option<i64>, order: SortOrder) -> Ordering {
    let natural = a.cmp(&b);
    match order {
        SortOrder::Ascending => natural,
        SortOrder::Descending => natural.reverse(),
    }
}

impl DataSource for InMemoryTable {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch_page(&self, query: &PageQuery) -> Result<Vec<RawRow>, SourceError> {
        let key_of = |row: &RawRow| row.get(&query.sort_key).and_then(|v| v.as_i64());

        let mut page: Vec<RawRow> = {
            let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
            rows.iter()
                .filter(|row| match query.after {
                    // a comparison with NULL never matches
                    Some(cursor) => key_of(row).is_some_and(|k| query.order.is_after(k, cursor)),
                    None => true,
                })
                .cloned()
                .collect()
        };

        page.sort_by(|a, b| compare_keys(key_of(a), key_of(b), query.order));
        page.truncate(query.limit);
        Ok(page)
    }
}
