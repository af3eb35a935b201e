//! Capability traits shared by readers, writers and standalone streams.

use std::fmt::Debug;

use crate::error::Result;
use crate::record::Record;

/// A resource with an explicit lifecycle bracketing one step execution.
///
/// `open` is called once before first use and `close` once afterwards,
/// on success and failure alike. Closing a stream that was never opened
/// is a no-op.
pub trait ItemStream: Send + Debug {
    fn open(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// Yields records one at a time.
pub trait ItemReader: ItemStream {
    /// Next record, or `None` once the source is exhausted.
    fn read(&mut self) -> Result<Option<Record>>;
}

/// What one writer produced, for reporting after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    /// Destination name, e.g. the classification key
    pub destination: String,
    /// Resolved target id (file path for file outputs)
    pub target: Option<String>,
    /// Lines committed to the target
    pub lines: usize,
}

/// Consumes records, buffering them until the enclosing chunk commits.
///
/// A chunk commits in two phases. `flush` moves the buffered lines to the
/// output and may fail; `commit` then makes them count and cannot fail.
/// Until `commit`, `rollback` removes everything the chunk wrote, including
/// lines a `flush` already pushed out. Writers grouped under one chunk are
/// all flushed before any of them commits.
pub trait ItemWriter: ItemStream {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Buffer one record as part of the current chunk.
    fn write(&mut self, record: &Record) -> Result<()>;

    /// Push the current chunk to the output without committing it.
    fn flush(&mut self) -> Result<()>;

    /// Make the flushed chunk permanent.
    fn commit(&mut self);

    /// Discard the current chunk, undoing any uncommitted flush.
    fn rollback(&mut self);

    /// Committed output per destination.
    fn outputs(&self) -> Vec<OutputSummary>;
}
