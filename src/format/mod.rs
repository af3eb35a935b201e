//! Line formats turning records into their on-disk text.
//!
//! This module provides:
//! - `FormatKind`: Enum naming the available line formats
//! - `FormatError`: Errors that can occur during format operations
//! - `LineFormat`: Trait implemented by every line format
//! - `JsonLinesFormat` and `DelimitedFormat`: The built-in formats

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::Record;

mod delimited;
mod json_lines;

pub use delimited::DelimitedFormat;
pub use json_lines::JsonLinesFormat;

/// Represents the available line formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    /// One JSON object per line
    #[default]
    JsonLines,
    /// Delimiter-separated fields, quoted where needed
    Delimited,
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatKind::JsonLines => write!(f, "json_lines"),
            FormatKind::Delimited => write!(f, "delimited"),
        }
    }
}

impl std::str::FromStr for FormatKind {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json_lines" | "jsonl" | "ndjson" | "json" => Ok(FormatKind::JsonLines),
            "delimited" | "csv" => Ok(FormatKind::Delimited),
            other => Err(FormatError::UnknownFormat(other.to_string())),
        }
    }
}

/// Errors that can occur during format operations.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The requested format is unknown
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// The delimiter cannot be used by the delimited format
    #[error("Invalid delimiter {0:?}: expected a single ASCII character other than a quote or newline")]
    InvalidDelimiter(char),

    /// Serialization/deserialization error
    #[error("Serde error: {0}")]
    Serde(Box<dyn std::error::Error + Send + Sync>),

    /// A line does not hold a well-formed record
    #[error("Malformed line: {0}")]
    Malformed(String),
}

/// Serializes records to single text lines and back.
///
/// `format` returns the line without its terminating newline. `parse` is
/// the exact inverse over all four record fields.
pub trait LineFormat: Send + Sync + Debug {
    fn kind(&self) -> FormatKind;

    fn format(&self, record: &Record) -> Result<String, FormatError>;

    fn parse(&self, line: &str) -> Result<Record, FormatError>;
}

/// Build the line format for `kind`. `delimiter` only applies to
/// [`FormatKind::Delimited`].
pub fn line_format(kind: FormatKind, delimiter: char) -> Result<Arc<dyn LineFormat>, FormatError> {
    match kind {
        FormatKind::JsonLines => Ok(Arc::new(JsonLinesFormat)),
        FormatKind::Delimited => Ok(Arc::new(DelimitedFormat::new(delimiter)?)),
    }
}
