//! Error types for batchfan pipeline runs.
//!
//! This module provides:
//! - `Stage`: Indicates where in an output resource's lifecycle an error occurred
//! - `SingleIoError`: A single output resource error with context
//! - `AggregateError`: A collection of resource errors, used when every
//!   resource must be released even after some of them fail
//! - `BatchError`: The error taxonomy surfaced by readers, writers, steps and jobs

use std::fmt;

use thiserror::Error;

use crate::format::FormatError;
use crate::source::SourceError;

/// Convenience alias used throughout the crate.
pub type Result<T, E = BatchError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolveOutput,
    /// Error while opening the output stream
    Open,
    Write,
    /// Error while committing buffered lines
    Flush,
    Close,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ResolveOutput => write!(f, "ResolveOutput"),
            Stage::Open => write!(f, "Open"),
            Stage::Write => write!(f, "Write"),
            Stage::Flush => write!(f, "Flush"),
            Stage::Close => write!(f, "Close"),
        }
    }
}

#[derive(Debug)]
pub struct SingleIoError {
    /// Stage where the error occurred
    pub stage: Stage,
    /// Identifier of the target (destination name or file path)
    pub target: String,
    /// The underlying error
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl SingleIoError {
    pub fn new(
        stage: Stage,
        target: impl Into<String>,
        error: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            stage,
            target: target.into(),
            error: error.into(),
        }
    }
}

impl fmt::Display for SingleIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.target, self.error)
    }
}

impl std::error::Error for SingleIoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

/// An aggregate of multiple resource errors.
///
/// Returned by close paths, which keep releasing the remaining resources
/// after one of them fails.
#[derive(Debug, Error)]
pub struct AggregateError {
    /// Collection of individual errors
    pub errors: Vec<SingleIoError>,
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "I/O encountered {} error(s):", self.errors.len())?;
        for (i, e) in self.errors.iter().enumerate() {
            writeln!(f, "  #{}: {}", i + 1, e)?;
        }
        Ok(())
    }
}

impl AggregateError {
    /// Create a new aggregate error with a single error.
    pub fn single(error: SingleIoError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Check if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Fold another batch error into this aggregate.
    ///
    /// Nested aggregates are flattened; non-resource errors are recorded
    /// against `target` at `stage`.
    pub fn absorb(&mut self, stage: Stage, target: &str, error: BatchError) {
        match error {
            BatchError::Aggregate(inner) => self.errors.extend(inner.errors),
            BatchError::Resource(single) => self.errors.push(single),
            other => self.errors.push(SingleIoError::new(stage, target, other)),
        }
    }

    /// `Ok(())` when nothing was collected, the aggregate otherwise.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(BatchError::Aggregate(self))
        }
    }
}

impl Default for AggregateError {
    fn default() -> Self {
        Self { errors: Vec::new() }
    }
}

impl From<SingleIoError> for AggregateError {
    fn from(error: SingleIoError) -> Self {
        Self::single(error)
    }
}

/// Errors surfaced by a pipeline run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A source row could not be converted into a record.
    #[error("cannot map row {row}: {reason}")]
    Mapping { row: usize, reason: String },

    /// The paging query could not be executed.
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// The classifier produced a key that has no registered writer.
    #[error("no writer registered for classification key '{key}'")]
    UnroutableRecord { key: String },

    /// Open, write, flush or close failure on one output resource.
    #[error(transparent)]
    Resource(#[from] SingleIoError),

    /// Several output resources failed while being released.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// A record could not be turned into a line.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// The job already completed with exactly these parameters.
    #[error("job '{job}' already ran with parameters {parameters}")]
    DuplicateRun { job: String, parameters: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BatchError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        BatchError::Config(msg.into())
    }
}

#[cfg(feature = "miette")]
mod miette_impl;

#[cfg(feature = "miette")]
pub use miette_impl::*;
