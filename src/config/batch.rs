//! Batch job configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::OutputConfig;
use crate::error::{BatchError, Result};
use crate::format::FormatKind;
use crate::io::FileExistsPolicy;
use crate::reader::DEFAULT_FETCH_SIZE;
use crate::step::DEFAULT_CHUNK_SIZE;

/// Configuration for one batch job.
///
/// Every field has a default, so an empty document is a valid
/// configuration for the reference job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub job_name: String,
    pub step_name: String,
    /// Table the pages are read from
    pub table: String,
    /// Rows per page query
    pub fetch_size: usize,
    /// Records per committed chunk
    pub chunk_size: usize,
    pub format: FormatKind,
    /// Field delimiter for the delimited format
    pub delimiter: char,
    pub output: OutputConfig,
    pub file_exists_policy: FileExistsPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            job_name: "job".into(),
            step_name: "step1".into(),
            table: "customer".into(),
            fetch_size: DEFAULT_FETCH_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            format: FormatKind::JsonLines,
            delimiter: ',',
            output: OutputConfig::default(),
            file_exists_policy: FileExistsPolicy::Overwrite,
        }
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(s)
            .map_err(|e| BatchError::config(format!("invalid YAML configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| BatchError::config(format!("invalid JSON configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file; `.json` files are read as JSON, anything
    /// else as YAML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BatchError::config(format!("cannot read '{}': {e}", path.display()))
        })?;
        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Reject settings no job can run with.
    pub fn validate(&self) -> Result<()> {
        if self.fetch_size == 0 {
            return Err(BatchError::config("fetch_size must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(BatchError::config("chunk_size must be at least 1"));
        }
        if self.table.trim().is_empty() {
            return Err(BatchError::config("table must not be empty"));
        }
        if self.format == FormatKind::Delimited {
            crate::format::DelimitedFormat::new(self.delimiter)?;
        }
        Ok(())
    }

    pub fn with_fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = fetch_size;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_format(mut self, format: FormatKind) -> Self {
        self.format = format;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }
}
