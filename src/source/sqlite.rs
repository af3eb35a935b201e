//! `SQLite`-backed implementation of [`DataSource`].
//!
//! Uses a single `Mutex<Connection>` for thread safety.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use rusqlite::types::ValueRef;

use super::{DataSource, PageQuery, SourceError};
use crate::record::{RawRow, Value};

/// Idempotent DDL for the customer table.
pub const CREATE_CUSTOMER_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS customer (
    id INTEGER PRIMARY KEY,
    firstName TEXT,
    lastName TEXT,
    birthdate TEXT
);
";

/// `SQLite` data source.
///
/// Create with [`SqliteSource::open`] for an existing database file or
/// [`SqliteSource::in_memory`] for tests.
#[derive(Debug)]
pub struct SqliteSource {
    id: String,
    conn: Mutex<Connection>,
}

fn unavailable(path: &str, e: rusqlite::Error) -> SourceError {
    SourceError::Unavailable(format!("cannot open sqlite database '{path}': {e}"))
}

impl SqliteSource {
    /// Open a `SQLite` database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] if the database can't be opened.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let id = path.to_string_lossy().into_owned();
        let conn = Connection::open(path).map_err(|e| unavailable(&id, e))?;
        Ok(Self {
            id,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory `SQLite` database holding an empty `customer` table.
    pub fn in_memory() -> Result<Self, SourceError> {
        let conn = Connection::open_in_memory().map_err(|e| unavailable(":memory:", e))?;
        conn.execute_batch(CREATE_CUSTOMER_TABLE)
            .map_err(|e| unavailable(":memory:", e))?;
        Ok(Self {
            id: ":memory:".into(),
            conn: Mutex::new(conn),
        })
    }

    /// Run a batch of SQL statements, e.g. to seed a table.
    pub fn execute_batch(&self, sql: &str) -> Result<(), SourceError> {
        self.lock_conn()?
            .execute_batch(sql)
            .map_err(|e| query_error(sql, e))
    }

    /// Insert one customer row.
    pub fn insert_customer(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
        birthdate: &str,
    ) -> Result<(), SourceError> {
        const SQL: &str =
            "INSERT INTO customer (id, firstName, lastName, birthdate) VALUES (?1, ?2, ?3, ?4)";
        self.lock_conn()?
            .execute(
                SQL,
                rusqlite::params![id, first_name, last_name, birthdate],
            )
            .map(|_| ())
            .map_err(|e| query_error(SQL, e))
    }

    /// Acquire the connection lock.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, SourceError> {
        self.conn
            .lock()
            .map_err(|_| SourceError::Unavailable("sqlite connection lock poisoned".into()))
    }
}

fn query_error(sql: &str, e: rusqlite::Error) -> SourceError {
    SourceError::Query {
        sql: sql.to_string(),
        error: Box::new(e),
    }
}

fn to_value(raw: ValueRef<'_>) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

impl DataSource for SqliteSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch_page(&self, query: &PageQuery) -> Result<Vec<RawRow>, SourceError> {
        let sql = query.to_sql();
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&sql).map_err(|e| query_error(&sql, e))?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = match query.after {
            Some(cursor) => stmt.query(rusqlite::params![cursor]),
            None => stmt.query([]),
        }
        .map_err(|e| query_error(&sql, e))?;

        let mut page = Vec::with_capacity(query.limit.min(1024));
        while let Some(row) = rows.next().map_err(|e| query_error(&sql, e))? {
            let mut raw = RawRow::new();
            for (i, name) in names.iter().enumerate() {
                let value = row.get_ref(i).map_err(|e| query_error(&sql, e))?;
                raw.push(name.clone(), to_value(value));
            }
            page.push(raw);
        }
        Ok(page)
    }
}
