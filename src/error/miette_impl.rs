//! Miette integration for pretty error reporting.

use miette::{Diagnostic, Severity};
use thiserror::Error;

use super::{AggregateError, BatchError, SingleIoError};

/// A diagnostic wrapper for batch errors compatible with miette.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct BatchDiagnostic {
    /// The error message
    pub message: String,

    #[source]
    /// The underlying error source
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,

    #[help]
    /// Help text for the user
    pub help: Option<String>,

    #[diagnostic(severity)]
    /// Severity level
    pub severity: Severity,
}

fn help_for(error: &BatchError) -> &'static str {
    match error {
        BatchError::Mapping { .. } => "Check the customer table for rows without a numeric id",
        BatchError::SourceUnavailable(_) => "Check that the data source is reachable",
        BatchError::UnroutableRecord { .. } => {
            "Register a writer for every key the classifier can produce"
        }
        BatchError::Resource(_) | BatchError::Aggregate(_) => {
            "Check that the output location is writable"
        }
        BatchError::Format(_) => "Check the configured line format",
        BatchError::DuplicateRun { .. } => "Launch the job with freshly generated parameters",
        BatchError::Config(_) => "Check the batch configuration file",
    }
}

impl From<SingleIoError> for BatchDiagnostic {
    fn from(e: SingleIoError) -> Self {
        BatchDiagnostic {
            message: format!("[{}] on '{}'", e.stage, e.target),
            source: Some(e.error),
            help: Some("Check that the output location is writable".into()),
            severity: Severity::Error,
        }
    }
}

impl From<AggregateError> for BatchDiagnostic {
    fn from(agg: AggregateError) -> Self {
        let first = agg.errors.into_iter().next();
        if let Some(e) = first {
            BatchDiagnostic::from(e)
        } else {
            BatchDiagnostic {
                message: "Unknown I/O error".into(),
                source: None,
                help: None,
                severity: Severity::Error,
            }
        }
    }
}

impl From<BatchError> for BatchDiagnostic {
    fn from(e: BatchError) -> Self {
        match e {
            BatchError::Resource(single) => BatchDiagnostic::from(single),
            BatchError::Aggregate(agg) => BatchDiagnostic::from(agg),
            other => BatchDiagnostic {
                message: other.to_string(),
                help: Some(help_for(&other).into()),
                source: Some(Box::new(other)),
                severity: Severity::Error,
            },
        }
    }
}

impl From<BatchError> for miette::Report {
    fn from(e: BatchError) -> Self {
        miette::Report::new(BatchDiagnostic::from(e))
    }
}
