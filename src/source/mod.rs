//! Relational data sources queried one bounded page at a time.
//!
//! This module provides:
//! - `PageQuery`: A bounded, ordered SELECT with an optional keyset cursor
//! - `DataSource`: Trait for anything that can execute a `PageQuery`
//! - `InMemoryTable`: A table held in memory, for tests and demos
//! - `SqliteSource`: A SQLite-backed source (feature `sqlite`)

use std::fmt::{self, Debug};

use thiserror::Error;

use crate::record::RawRow;

mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use memory::InMemoryTable;
#[cfg(feature = "sqlite")]
pub use sqlite::{CREATE_CUSTOMER_TABLE, SqliteSource};

/// Errors raised while executing a page query.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The query was sent but the source rejected it or failed mid-way.
    #[error("query failed: {sql}: {error}")]
    Query {
        sql: String,
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The source could not be reached at all.
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }

    /// Comparison operator selecting rows strictly after the cursor.
    fn after_operator(self) -> &'static str {
        match self {
            SortOrder::Ascending => ">",
            SortOrder::Descending => "<",
        }
    }

    /// Whether `candidate` lies strictly after `cursor` in this order.
    pub fn is_after(self, candidate: i64, cursor: i64) -> bool {
        match self {
            SortOrder::Ascending => candidate > cursor,
            SortOrder::Descending => candidate < cursor,
        }
    }
}

/// A bounded, ordered page query.
///
/// The first page has no cursor. Every following page carries the sort key
/// of the last row already read and only selects rows strictly after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub select_clause: String,
    pub from_clause: String,
    /// Integer column the pages are ordered and continued by
    pub sort_key: String,
    pub order: SortOrder,
    /// Maximum number of rows in one page
    pub limit: usize,
    /// Sort key of the last row of the previous page
    pub after: Option<i64>,
}

impl PageQuery {
    /// Query for the `customer` table, newest id first.
    pub fn customer(table: impl Into<String>, fetch_size: usize) -> Self {
        Self {
            select_clause: "id, firstName, lastName, birthdate".into(),
            from_clause: table.into(),
            sort_key: "id".into(),
            order: SortOrder::Descending,
            limit: fetch_size,
            after: None,
        }
    }

    /// The same query continued after `cursor`.
    pub fn continue_after(&self, cursor: i64) -> Self {
        Self {
            after: Some(cursor),
            ..self.clone()
        }
    }

    /// Render to SQL. The cursor, when present, is bound as `?1`.
    pub fn to_sql(&self) -> String {
        let filter = match self.after {
            Some(_) => format!(
                " WHERE {} {} ?1",
                self.sort_key,
                self.order.after_operator()
            ),
            None => String::new(),
        };
        format!(
            "SELECT {} FROM {}{} ORDER BY {} {} LIMIT {}",
            self.select_clause,
            self.from_clause,
            filter,
            self.sort_key,
            self.order.keyword(),
            self.limit
        )
    }
}

impl fmt::Display for PageQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())?;
        if let Some(cursor) = self.after {
            write!(f, " [?1 = {cursor}]")?;
        }
        Ok(())
    }
}

/// A relational source that answers bounded page queries.
pub trait DataSource: Send + Sync + Debug {
    /// Returns an identifier for this source, used in logs.
    fn id(&self) -> &str;

    /// Execute one page query, returning at most `query.limit` rows in
    /// the query's order.
    fn fetch_page(&self, query: &PageQuery) -> Result<Vec<RawRow>, SourceError>;
}
