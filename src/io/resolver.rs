//! Allocation of output targets for named destinations.

use std::collections::HashMap;
use std::fmt::Debug;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use super::{FileOutput, InMemorySink, OutputTarget};

/// Resolves the output target for a destination when its writer opens.
///
/// Called once per destination per step execution, so a resolver can hand
/// out a fresh resource for every run.
pub trait OutputResolver: Send + Sync + Debug {
    fn resolve(&self, destination: &str) -> io::Result<Arc<dyn OutputTarget>>;
}

/// Allocates a uniquely named temporary file per destination per run,
/// e.g. `customerOutputEVEN3fK2a.out`.
///
/// Files are kept after the run; cleaning them up belongs to the caller.
#[derive(Debug, Clone)]
pub struct TempFileResolver {
    dir: Option<PathBuf>,
    prefix: String,
    suffix: String,
}

impl TempFileResolver {
    /// Temporary files in the system temp directory.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            dir: None,
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Temporary files inside `dir` instead of the system temp directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}

impl Default for TempFileResolver {
    fn default() -> Self {
        Self::new("customerOutput", ".out")
    }
}

impl OutputResolver for TempFileResolver {
    fn resolve(&self, destination: &str) -> io::Result<Arc<dyn OutputTarget>> {
        let prefix = format!("{}{}", self.prefix, destination);
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(&self.suffix);
        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let (_, path) = file.keep().map_err(|e| e.error)?;
        info!(destination, path = %path.display(), "allocated output file");
        Ok(Arc::new(FileOutput::new(path)))
    }
}

/// Places each destination at a fixed path `<dir>/<prefix><destination><suffix>`.
///
/// The same destination resolves to the same file on every run.
#[derive(Debug, Clone)]
pub struct DirResolver {
    dir: PathBuf,
    prefix: String,
    suffix: String,
}

impl DirResolver {
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn path_for(&self, destination: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}{}", self.prefix, destination, self.suffix))
    }
}

impl OutputResolver for DirResolver {
    fn resolve(&self, destination: &str) -> io::Result<Arc<dyn OutputTarget>> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(destination);
        info!(destination, path = %path.display(), "resolved output file");
        Ok(Arc::new(FileOutput::new(path)))
    }
}

/// Hands out one shared [`InMemorySink`] per destination.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    sinks: Arc<Mutex<HashMap<String, InMemorySink>>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sink for `destination`, created on first use.
    pub fn sink(&self, destination: &str) -> InMemorySink {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(destination.to_string())
            .or_insert_with(|| InMemorySink::new(destination))
            .clone()
    }
}

impl OutputResolver for MemoryResolver {
    fn resolve(&self, destination: &str) -> io::Result<Arc<dyn OutputTarget>> {
        Ok(Arc::new(self.sink(destination)))
    }
}
