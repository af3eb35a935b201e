//! Line-oriented writer over a single output target.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{BatchError, Result, SingleIoError, Stage};
use crate::format::LineFormat;
use crate::io::{FileExistsPolicy, OutputResolver, OutputTarget};
use crate::item::{ItemStream, ItemWriter, OutputSummary};
use crate::record::Record;

/// Writes one formatted, newline-terminated line per record.
///
/// The output target is resolved when the writer opens. Lines are held in
/// a transactional buffer until `flush`. The writer remembers how long the
/// target was at the last commit, so `rollback` can cut a flushed but
/// uncommitted chunk back out of the target.
pub struct FlatFileWriter {
    name: String,
    resolver: Arc<dyn OutputResolver>,
    format: Arc<dyn LineFormat>,
    policy: FileExistsPolicy,
    target: Option<Arc<dyn OutputTarget>>,
    stream: Option<Box<dyn Write + Send>>,
    pending: String,
    pending_lines: usize,
    /// Target length at the last commit
    committed_size: u64,
    committed_lines: usize,
    flushed_bytes: u64,
    flushed_lines: usize,
    /// Set once a flush has touched the target since the last commit
    uncommitted_output: bool,
}

impl std::fmt::Debug for FlatFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatFileWriter")
            .field("name", &self.name)
            .field("format", &self.format.kind())
            .field("target", &self.target.as_ref().map(|t| t.id()))
            .field("open", &self.stream.is_some())
            .field("pending_lines", &self.pending_lines)
            .field("flushed_lines", &self.flushed_lines)
            .field("committed_lines", &self.committed_lines)
            .finish()
    }
}

impl FlatFileWriter {
    pub fn new(
        name: impl Into<String>,
        resolver: Arc<dyn OutputResolver>,
        format: Arc<dyn LineFormat>,
    ) -> Self {
        Self {
            name: name.into(),
            resolver,
            format,
            policy: FileExistsPolicy::Overwrite,
            target: None,
            stream: None,
            pending: String::new(),
            pending_lines: 0,
            committed_size: 0,
            committed_lines: 0,
            flushed_bytes: 0,
            flushed_lines: 0,
            uncommitted_output: false,
        }
    }

    /// Set the file exists policy.
    pub fn with_file_exists_policy(mut self, policy: FileExistsPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The target resolved by the most recent `open`.
    pub fn target(&self) -> Option<&Arc<dyn OutputTarget>> {
        self.target.as_ref()
    }

    fn target_id(&self) -> String {
        match &self.target {
            Some(target) => target.id().to_string(),
            None => self.name.clone(),
        }
    }

    fn io_error(&self, stage: Stage, error: std::io::Error) -> BatchError {
        BatchError::Resource(SingleIoError::new(stage, self.target_id(), error))
    }

    fn resolve_error(&self, error: std::io::Error) -> BatchError {
        BatchError::Resource(SingleIoError::new(Stage::ResolveOutput, &self.name, error))
    }

    fn discard_pending(&mut self) {
        self.pending.clear();
        self.pending_lines = 0;
    }

    /// Cut the target back to its length at the last commit.
    fn undo_flushed(&mut self) {
        if self.uncommitted_output {
            if let Some(target) = &self.target {
                match target.truncate(self.committed_size) {
                    Ok(()) => debug!(
                        writer = %self.name,
                        lines = self.flushed_lines,
                        "removed uncommitted lines from target"
                    ),
                    Err(e) => warn!(
                        writer = %self.name,
                        target = target.id(),
                        error = %e,
                        "failed to remove uncommitted lines from target"
                    ),
                }
            }
        }
        self.flushed_bytes = 0;
        self.flushed_lines = 0;
        self.uncommitted_output = false;
    }
}

impl ItemStream for FlatFileWriter {
    fn open(&mut self) -> Result<()> {
        let target = self
            .resolver
            .resolve(&self.name)
            .map_err(|e| self.resolve_error(e))?;
        self.target = Some(target.clone());

        let stream = target
            .open_with(self.policy)
            .map_err(|e| self.io_error(Stage::Open, e))?;
        let size = target.size().map_err(|e| self.io_error(Stage::Open, e))?;

        debug!(writer = %self.name, target = target.id(), size, "opened writer");
        self.stream = Some(stream);
        self.discard_pending();
        self.committed_size = size;
        self.committed_lines = 0;
        self.flushed_bytes = 0;
        self.flushed_lines = 0;
        self.uncommitted_output = false;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.discard_pending();
        self.undo_flushed();
        match self.stream.take() {
            Some(mut stream) => {
                stream.flush().map_err(|e| self.io_error(Stage::Close, e))?;
                debug!(writer = %self.name, lines = self.committed_lines, "closed writer");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ItemWriter for FlatFileWriter {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, record: &Record) -> Result<()> {
        if self.stream.is_none() {
            return Err(self.io_error(
                Stage::Write,
                std::io::Error::new(std::io::ErrorKind::NotConnected, "writer is not open"),
            ));
        }
        let line = self.format.format(record)?;
        self.pending.push_str(&line);
        self.pending.push('\n');
        self.pending_lines += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        // a failed write may leave part of the chunk behind
        self.uncommitted_output = true;
        let result = match self.stream.as_mut() {
            Some(stream) => stream
                .write_all(self.pending.as_bytes())
                .and_then(|()| stream.flush()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "writer is not open",
            )),
        };
        if let Err(e) = result {
            return Err(self.io_error(Stage::Flush, e));
        }

        self.flushed_bytes += self.pending.len() as u64;
        self.flushed_lines += self.pending_lines;
        self.discard_pending();
        Ok(())
    }

    fn commit(&mut self) {
        self.committed_size += self.flushed_bytes;
        self.committed_lines += self.flushed_lines;
        self.flushed_bytes = 0;
        self.flushed_lines = 0;
        self.uncommitted_output = false;
    }

    fn rollback(&mut self) {
        if self.pending_lines > 0 {
            debug!(writer = %self.name, lines = self.pending_lines, "discarding uncommitted lines");
        }
        self.discard_pending();
        self.undo_flushed();
    }

    fn outputs(&self) -> Vec<OutputSummary> {
        vec![OutputSummary {
            destination: self.name.clone(),
            target: self.target.as_ref().map(|t| t.id().to_string()),
            lines: self.committed_lines,
        }]
    }
}
