//! Jobs, their run parameters, and the launcher that executes them.
//!
//! This module provides:
//! - `Job`: A named, fixed sequence of steps
//! - `JobParameters`: The identifying parameters of one run
//! - `JobRepository`: Bookkeeping of runs, rejecting repeated completed runs
//! - `JobLauncher`: Blocking entry point running a job to a terminal status

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info};

use crate::error::{BatchError, Result};
use crate::step::{Step, StepExecution};

/// Status of a job execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchStatus {
    Starting,
    Started,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn is_running(self) -> bool {
        matches!(self, BatchStatus::Starting | BatchStatus::Started)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchStatus::Starting => "STARTING",
            BatchStatus::Started => "STARTED",
            BatchStatus::Completed => "COMPLETED",
            BatchStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobParameter {
    String(String),
    Date(DateTime<Utc>),
    Long(i64),
}

impl fmt::Display for JobParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobParameter::String(s) => f.write_str(s),
            JobParameter::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            JobParameter::Long(v) => write!(f, "{v}"),
        }
    }
}

/// Per-process counter disambiguating runs generated in the same millisecond.
static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// The identifying parameters of one job run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JobParameters {
    entries: BTreeMap<String, JobParameter>,
}

impl JobParameters {
    /// Fresh parameters unique to this invocation.
    ///
    /// Holds `JobId` (millis and sequence as a string), `date`, `time`
    /// (epoch millis) and `sequence`. The sequence comes from a process-wide
    /// atomic counter, so concurrent invocations never collide.
    pub fn generate() -> Self {
        let now = Utc::now();
        let millis = now.timestamp_millis();
        let sequence = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        JobParametersBuilder::new()
            .add_string("JobId", format!("{millis}-{sequence}"))
            .add_date("date", now)
            .add_long("time", millis)
            .add_long("sequence", sequence as i64)
            .build()
    }

    pub fn get(&self, key: &str) -> Option<&JobParameter> {
        self.entries.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(JobParameter::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.entries.get(key) {
            Some(JobParameter::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for JobParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobParametersBuilder {
    entries: BTreeMap<String, JobParameter>,
}

impl JobParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .insert(key.into(), JobParameter::String(value.into()));
        self
    }

    pub fn add_date(mut self, key: impl Into<String>, value: DateTime<Utc>) -> Self {
        self.entries.insert(key.into(), JobParameter::Date(value));
        self
    }

    pub fn add_long(mut self, key: impl Into<String>, value: i64) -> Self {
        self.entries.insert(key.into(), JobParameter::Long(value));
        self
    }

    pub fn build(self) -> JobParameters {
        JobParameters {
            entries: self.entries,
        }
    }
}

/// A named, fixed sequence of steps run strictly in order.
pub struct Job {
    name: String,
    steps: Vec<Box<dyn Step>>,
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field(
                "steps",
                &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn step(mut self, step: Box<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

/// Outcome of one job run.
#[derive(Debug, Clone)]
pub struct JobExecution {
    pub id: u64,
    pub job_name: String,
    pub parameters: JobParameters,
    pub status: BatchStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub step_executions: Vec<StepExecution>,
    pub failures: Vec<String>,
}

impl JobExecution {
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    pub fn step(&self, name: &str) -> Option<&StepExecution> {
        self.step_executions.iter().find(|s| s.step_name == name)
    }
}

type RunKey = (String, JobParameters);

#[derive(Debug, Default)]
struct Runs {
    status: HashMap<RunKey, BatchStatus>,
    /// Runs in a terminal state, oldest first
    finished: VecDeque<RunKey>,
}

/// In-memory record of job runs, scoped to the process.
///
/// A run is identified by its job name and parameters. Launching a run
/// whose identity is already completed or still running is rejected.
///
/// By default every run is kept. [`JobRepository::with_retention`] bounds
/// the number of finished runs remembered; once a finished run is evicted,
/// its parameters are no longer recognized as a duplicate. Running runs are
/// never evicted.
#[derive(Debug, Default)]
pub struct JobRepository {
    runs: Mutex<Runs>,
    next_id: AtomicU64,
    retention: Option<usize>,
}

impl JobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember at most `finished_runs` completed or failed runs.
    pub fn with_retention(finished_runs: usize) -> Self {
        Self {
            retention: Some(finished_runs),
            ..Self::default()
        }
    }

    fn lock_runs(&self) -> MutexGuard<'_, Runs> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new run and return its execution id.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::DuplicateRun`] when the same job already ran, or
    /// is running, with identical parameters. A failed run may be launched
    /// again.
    pub fn create_execution(&self, job_name: &str, parameters: &JobParameters) -> Result<u64> {
        let mut runs = self.lock_runs();
        let key = (job_name.to_string(), parameters.clone());
        let previous = runs.status.get(&key).copied();
        let already_ran = previous
            .is_some_and(|status| status == BatchStatus::Completed || status.is_running());
        if already_ran {
            return Err(BatchError::DuplicateRun {
                job: job_name.to_string(),
                parameters: parameters.to_string(),
            });
        }
        if previous.is_some() {
            // a failed run being relaunched is running again
            runs.finished.retain(|k| k != &key);
        }
        runs.status.insert(key, BatchStatus::Started);
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn update_status(&self, job_name: &str, parameters: &JobParameters, status: BatchStatus) {
        let mut runs = self.lock_runs();
        let key = (job_name.to_string(), parameters.clone());
        let was_finished = runs.status.get(&key).is_some_and(|s| !s.is_running());
        runs.status.insert(key.clone(), status);
        if status.is_running() || was_finished {
            return;
        }
        runs.finished.push_back(key);

        if let Some(limit) = self.retention {
            while runs.finished.len() > limit {
                if let Some(oldest) = runs.finished.pop_front() {
                    runs.status.remove(&oldest);
                }
            }
        }
    }

    /// Last known status of a run.
    pub fn status(&self, job_name: &str, parameters: &JobParameters) -> Option<BatchStatus> {
        self.lock_runs()
            .status
            .get(&(job_name.to_string(), parameters.clone()))
            .copied()
    }

    /// Number of runs currently remembered.
    pub fn run_count(&self) -> usize {
        self.lock_runs().status.len()
    }
}

/// Runs jobs to completion.
///
/// `run` blocks until the job reaches a terminal status; there is nothing
/// to poll.
#[derive(Debug, Clone, Default)]
pub struct JobLauncher {
    repository: Arc<JobRepository>,
}

impl JobLauncher {
    pub fn new(repository: Arc<JobRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<JobRepository> {
        &self.repository
    }

    /// Run `job` with freshly generated parameters.
    pub fn launch(&self, job: &mut Job) -> Result<JobExecution> {
        self.run(job, JobParameters::generate())
    }

    /// Run `job` with `parameters`.
    ///
    /// A step failure does not make this return `Err`: the execution comes
    /// back with status `FAILED` and the failure recorded. `Err` is reserved
    /// for runs that could not be started at all.
    pub fn run(&self, job: &mut Job, parameters: JobParameters) -> Result<JobExecution> {
        let id = self.repository.create_execution(&job.name, &parameters)?;
        info!(job = %job.name, execution = id, %parameters, "job launched");

        let mut execution = JobExecution {
            id,
            job_name: job.name.clone(),
            parameters,
            status: BatchStatus::Started,
            start_time: Utc::now(),
            end_time: None,
            step_executions: Vec::with_capacity(job.steps.len()),
            failures: Vec::new(),
        };

        let mut status = BatchStatus::Completed;
        for step in job.steps.iter_mut() {
            let mut step_execution = StepExecution::new(step.name());
            let result = step.execute(&mut step_execution);
            execution.step_executions.push(step_execution);
            if let Err(e) = result {
                error!(
                    job = %job.name,
                    step = step.name(),
                    error = %e,
                    "step failed, stopping job"
                );
                execution.failures.push(e.to_string());
                status = BatchStatus::Failed;
                break;
            }
        }

        execution.status = status;
        execution.end_time = Some(Utc::now());
        self.repository
            .update_status(&job.name, &execution.parameters, status);
        info!(job = %job.name, execution = id, %status, "job finished");
        Ok(execution)
    }
}
