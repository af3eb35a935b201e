//! # batchfan
//!
//! A chunk-oriented batch pipeline that reads a relational table page by
//! page and fans every record out to one of several file destinations.
//!
//! ## Overview
//!
//! batchfan provides:
//! - **Paged reading**: Bounded `ORDER BY id DESC` queries continued by keyset,
//!   yielding records one at a time in strictly descending id order
//! - **Classification**: A pure classifier maps every record to a destination key
//! - **Composite writing**: One flat file writer per key, opened, committed and
//!   closed together as one resource group
//! - **Chunked commits**: Records are committed in fixed-size chunks; a failing
//!   chunk is rolled back and every resource is still released
//! - **Jobs**: Steps sequenced into a job, launched with generated parameters
//!   unique to each run
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use batchfan::{BatchBuilder, BatchConfig, InMemoryTable, JobLauncher};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = InMemoryTable::customers(
//!         "customer",
//!         &[(1, "A", "X", "1990-01-01"), (2, "B", "Y", "1991-02-02")],
//!     );
//!
//!     let mut job = BatchBuilder::new(BatchConfig::default())
//!         .with_source(Arc::new(table))
//!         .build()?;
//!
//!     let execution = JobLauncher::default().launch(&mut job)?;
//!     println!("{}", execution.status); // COMPLETED
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `sqlite` - SQLite data source via rusqlite (enabled by default)
//! - `server` - `GET /load/job` trigger endpoint with axum
//! - `cli` - Log output for the bundled binaries
//! - `miette` - Pretty error reporting with miette
//!
//! ## Run semantics
//!
//! - A step opens the reader, the composite writer and any extra streams,
//!   then loops: read up to `chunk_size` records, write each to the writer
//!   chosen by the classifier, flush all writers. An empty read ends the loop.
//! - Writers buffer the lines of the current chunk in memory; only a flush
//!   moves them to the output. When any read, write or flush fails, the
//!   chunk is discarded, all resources are closed, and the job ends `FAILED`.
//! - Output files are resolved when a writer opens. The default resolver
//!   allocates a new temporary file per destination per run.
//! - Pages are re-queried from the live table with no snapshot; rows changed
//!   during a run may be skipped or seen twice.

// Core modules
pub mod builder;
pub mod classify;
pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod item;
pub mod job;
pub mod reader;
pub mod record;
pub mod source;
pub mod step;
pub mod writer;

#[cfg(feature = "server")]
pub mod server;

// Re-exports for convenience
pub use builder::BatchBuilder;
pub use classify::{Classifier, FnClassifier, Parity, ParityClassifier};
pub use config::{BatchConfig, OutputConfig};
pub use error::{AggregateError, BatchError, SingleIoError, Stage};
pub use format::{DelimitedFormat, FormatError, FormatKind, JsonLinesFormat, LineFormat};
pub use io::{
    DirResolver, FileExistsPolicy, FileOutput, InMemorySink, MemoryResolver, OutputResolver,
    OutputTarget, TempFileResolver,
};
pub use item::{ItemReader, ItemStream, ItemWriter, OutputSummary};
pub use job::{BatchStatus, Job, JobExecution, JobLauncher, JobParameters, JobRepository};
pub use reader::PagingReader;
pub use record::{CustomerRowMapper, RawRow, Record, Row, RowMapper, Value};
#[cfg(feature = "sqlite")]
pub use source::SqliteSource;
pub use source::{DataSource, InMemoryTable, PageQuery, SortOrder, SourceError};
pub use step::{ChunkStep, Step, StepExecution, StepState};
pub use writer::{ClassifierCompositeWriter, FlatFileWriter};

// Miette re-exports
#[cfg(feature = "miette")]
pub use error::BatchDiagnostic;
