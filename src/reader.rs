//! Paging reader over a [`DataSource`].

use std::sync::Arc;

use tracing::debug;

use crate::error::{BatchError, Result};
use crate::item::{ItemReader, ItemStream};
use crate::record::{CustomerRowMapper, RawRow, Record, RowMapper};
use crate::source::{DataSource, PageQuery};

/// Default number of rows fetched per page.
pub const DEFAULT_FETCH_SIZE: usize = 1000;

/// Reads records one at a time, fetching a new page whenever the current
/// one is drained.
///
/// Pages are continued by keyset: the id of the last record read becomes
/// the cursor of the next query, so iteration stays strictly ordered across
/// page boundaries. Rows are mapped lazily, so a bad row fails the read that
/// reaches it rather than the whole page.
#[derive(Debug)]
pub struct PagingReader {
    source: Arc<dyn DataSource>,
    mapper: Box<dyn RowMapper>,
    query: PageQuery,
    page: Vec<RawRow>,
    index: usize,
    cursor: Option<i64>,
    exhausted: bool,
    page_count: usize,
    read_count: usize,
}

impl PagingReader {
    /// Create a reader for `query`. The query's `limit` is the fetch size.
    pub fn new(source: Arc<dyn DataSource>, query: PageQuery) -> Result<Self> {
        if query.limit == 0 {
            return Err(BatchError::config("fetch size must be at least 1"));
        }
        Ok(Self {
            source,
            mapper: Box::new(CustomerRowMapper),
            query,
            page: Vec::new(),
            index: 0,
            cursor: None,
            exhausted: false,
            page_count: 0,
            read_count: 0,
        })
    }

    /// Replace the row mapper.
    pub fn with_mapper(mut self, mapper: Box<dyn RowMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn fetch_size(&self) -> usize {
        self.query.limit
    }

    /// Number of page queries issued since `open`.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Number of records returned since `open`.
    pub fn read_count(&self) -> usize {
        self.read_count
    }

    fn reset(&mut self) {
        self.page.clear();
        self.index = 0;
        self.cursor = None;
        self.exhausted = false;
        self.page_count = 0;
        self.read_count = 0;
    }

    fn fetch_next_page(&mut self) -> Result<()> {
        let query = match self.cursor {
            Some(cursor) => self.query.continue_after(cursor),
            None => self.query.clone(),
        };

        let rows = self.source.fetch_page(&query)?;
        self.page_count += 1;
        debug!(
            source = self.source.id(),
            page = self.page_count,
            rows = rows.len(),
            cursor = ?self.cursor,
            "fetched page"
        );

        // A short page is the last one; skip the extra empty query.
        if rows.len() < self.query.limit {
            self.exhausted = true;
        }
        self.page = rows;
        self.index = 0;
        Ok(())
    }
}

impl ItemStream for PagingReader {
    fn open(&mut self) -> Result<()> {
        self.reset();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.page = Vec::new();
        self.index = 0;
        Ok(())
    }
}

impl ItemReader for PagingReader {
    fn read(&mut self) -> Result<Option<Record>> {
        if self.index >= self.page.len() {
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_next_page()?;
            if self.page.is_empty() {
                self.exhausted = true;
                return Ok(None);
            }
        }

        let record = self
            .mapper
            .map_row(&self.page[self.index], self.read_count)?;
        self.index += 1;
        self.read_count += 1;
        self.cursor = Some(record.id());
        Ok(Some(record))
    }
}
