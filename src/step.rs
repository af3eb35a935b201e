//! Chunk-oriented step execution.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{AggregateError, BatchError, Result, Stage};
use crate::item::{ItemReader, ItemStream, ItemWriter, OutputSummary};
use crate::record::Record;

/// Default number of records committed together.
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Where a step execution currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepState {
    #[default]
    NotStarted,
    Opening,
    Reading,
    Writing,
    Committing,
    Closing,
    Completed,
    Failed,
}

impl StepState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Completed | StepState::Failed)
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepState::NotStarted => "NOT_STARTED",
            StepState::Opening => "OPENING",
            StepState::Reading => "READING",
            StepState::Writing => "WRITING",
            StepState::Committing => "COMMITTING",
            StepState::Closing => "CLOSING",
            StepState::Completed => "COMPLETED",
            StepState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Counters and outcome of one step execution.
#[derive(Debug, Clone)]
pub struct StepExecution {
    pub step_name: String,
    pub state: StepState,
    pub read_count: usize,
    /// Records committed; records of a rolled back chunk are not counted
    pub write_count: usize,
    pub commit_count: usize,
    pub rollback_count: usize,
    /// Committed output per destination, captured after close
    pub outputs: Vec<OutputSummary>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub failure: Option<String>,
}

impl StepExecution {
    pub fn new(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            state: StepState::NotStarted,
            read_count: 0,
            write_count: 0,
            commit_count: 0,
            rollback_count: 0,
            outputs: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            failure: None,
        }
    }

    /// Committed output for `destination`, if that writer took part.
    pub fn output(&self, destination: &str) -> Option<&OutputSummary> {
        self.outputs.iter().find(|o| o.destination == destination)
    }
}

/// A unit of work sequenced by a job.
pub trait Step: Send {
    fn name(&self) -> &str;

    /// Run the step to a terminal state, recording progress in `execution`.
    ///
    /// Returns the error that failed the step; `execution.state` is
    /// `Failed` in that case.
    fn execute(&mut self, execution: &mut StepExecution) -> Result<()>;
}

/// Reads, writes and commits records in fixed-size chunks.
///
/// The reader, the writer and any registered streams are opened before the
/// first chunk and closed after the last one, whether the step completes
/// or fails. A chunk is committed by flushing and then committing the
/// writer; if any record of a chunk fails to read, write or flush, the
/// chunk's output is rolled back instead.
pub struct ChunkStep {
    name: String,
    chunk_size: usize,
    reader: Box<dyn ItemReader>,
    writer: Box<dyn ItemWriter>,
    streams: Vec<Box<dyn ItemStream>>,
}

impl fmt::Debug for ChunkStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkStep")
            .field("name", &self.name)
            .field("chunk_size", &self.chunk_size)
            .field("reader", &self.reader)
            .field("writer", &self.writer)
            .field("streams", &self.streams.len())
            .finish()
    }
}

impl ChunkStep {
    pub fn new(
        name: impl Into<String>,
        chunk_size: usize,
        reader: Box<dyn ItemReader>,
        writer: Box<dyn ItemWriter>,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(BatchError::config("chunk size must be at least 1"));
        }
        Ok(Self {
            name: name.into(),
            chunk_size,
            reader,
            writer,
            streams: Vec::new(),
        })
    }

    /// Register a standalone stream opened and closed with the step.
    pub fn with_stream(mut self, stream: Box<dyn ItemStream>) -> Self {
        self.streams.push(stream);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn open_all(&mut self) -> Result<()> {
        self.reader.open()?;
        self.writer.open()?;
        for stream in self.streams.iter_mut() {
            stream.open()?;
        }
        Ok(())
    }

    fn close_all(&mut self) -> Result<()> {
        let mut errors = AggregateError::default();
        if let Err(e) = self.writer.close() {
            errors.absorb(Stage::Close, self.writer.name(), e);
        }
        for stream in self.streams.iter_mut() {
            if let Err(e) = stream.close() {
                errors.absorb(Stage::Close, &self.name, e);
            }
        }
        if let Err(e) = self.reader.close() {
            errors.absorb(Stage::Close, &self.name, e);
        }
        errors.into_result()
    }

    fn read_chunk(&mut self, execution: &mut StepExecution) -> Result<Vec<Record>> {
        let mut chunk = Vec::with_capacity(self.chunk_size);
        while chunk.len() < self.chunk_size {
            match self.reader.read()? {
                Some(record) => {
                    execution.read_count += 1;
                    chunk.push(record);
                }
                None => break,
            }
        }
        Ok(chunk)
    }

    fn process_chunks(&mut self, execution: &mut StepExecution) -> Result<()> {
        loop {
            execution.state = StepState::Reading;
            let chunk = self.read_chunk(execution)?;
            if chunk.is_empty() {
                return Ok(());
            }

            execution.state = StepState::Writing;
            for record in &chunk {
                self.writer.write(record)?;
            }

            execution.state = StepState::Committing;
            self.writer.flush()?;
            self.writer.commit();
            execution.commit_count += 1;
            execution.write_count += chunk.len();
            debug!(
                step = %self.name,
                chunk = execution.commit_count,
                records = chunk.len(),
                "committed chunk"
            );
        }
    }
}

impl Step for ChunkStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, execution: &mut StepExecution) -> Result<()> {
        info!(step = %self.name, chunk_size = self.chunk_size, "executing step");
        execution.state = StepState::Opening;

        let result = self.open_all().and_then(|()| {
            let processed = self.process_chunks(execution);
            if processed.is_err() {
                self.writer.rollback();
                execution.rollback_count += 1;
            }
            processed
        });

        execution.state = StepState::Closing;
        let closed = self.close_all();
        execution.outputs = self.writer.outputs();
        execution.end_time = Some(Utc::now());

        let outcome = match (result, closed) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(close_err)) => Err(close_err),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                // the failure that stopped the step wins; the close errors are still reported
                warn!(
                    step = %self.name,
                    error = %close_err,
                    "failed to release resources after step failure"
                );
                Err(e)
            }
        };

        match &outcome {
            Ok(()) => {
                execution.state = StepState::Completed;
                info!(
                    step = %self.name,
                    read = execution.read_count,
                    written = execution.write_count,
                    commits = execution.commit_count,
                    "step completed"
                );
            }
            Err(e) => {
                execution.state = StepState::Failed;
                execution.failure = Some(e.to_string());
                warn!(step = %self.name, error = %e, "step failed");
            }
        }
        outcome
    }
}
