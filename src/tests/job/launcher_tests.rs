//! Tests for the job launcher and repository.

use std::sync::{Arc, Mutex};

use crate::error::{BatchError, Result};
use crate::job::{BatchStatus, Job, JobLauncher, JobParametersBuilder, JobRepository};
use crate::step::{Step, StepExecution, StepState};

/// A step that logs its name and succeeds or fails as told.
struct ScriptedStep {
    name: String,
    fail: bool,
    log: Arc<Mutex<Vec<String>>>,
}

impl Step for ScriptedStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, execution: &mut StepExecution) -> Result<()> {
        self.log.lock().unwrap().push(self.name.clone());
        if self.fail {
            execution.state = StepState::Failed;
            return Err(BatchError::Config(format!("{} exploded", self.name)));
        }
        execution.state = StepState::Completed;
        Ok(())
    }
}

fn job(steps: &[(&str, bool)], log: &Arc<Mutex<Vec<String>>>) -> Job {
    steps.iter().fold(Job::new("job"), |job, (name, fail)| {
        job.step(Box::new(ScriptedStep {
            name: name.to_string(),
            fail: *fail,
            log: log.clone(),
        }))
    })
}

#[test]
fn steps_run_in_order_to_completion() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut job = job(&[("step1", false), ("step2", false)], &log);
    assert_eq!(job.step_names(), vec!["step1", "step2"]);

    let execution = JobLauncher::default().launch(&mut job).unwrap();
    assert_eq!(execution.status, BatchStatus::Completed);
    assert!(!execution.is_running());
    assert!(execution.end_time.is_some());
    assert_eq!(*log.lock().unwrap(), vec!["step1", "step2"]);
    assert_eq!(
        execution.step("step2").map(|s| s.state),
        Some(StepState::Completed)
    );
}

#[test]
fn failed_step_stops_the_job_and_reports_failed() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut job = job(&[("step1", true), ("step2", false)], &log);

    let execution = JobLauncher::default().launch(&mut job).unwrap();
    assert_eq!(execution.status, BatchStatus::Failed);
    assert_eq!(execution.status.to_string(), "FAILED");
    assert_eq!(*log.lock().unwrap(), vec!["step1"]);
    assert_eq!(execution.step_executions.len(), 1);
    assert_eq!(execution.failures.len(), 1);
    assert!(execution.failures[0].contains("step1 exploded"));
}

#[test]
fn completed_parameters_cannot_run_again() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut job = job(&[("step1", false)], &log);
    let launcher = JobLauncher::default();
    let params = JobParametersBuilder::new().add_string("JobId", "1").build();

    launcher.run(&mut job, params.clone()).unwrap();
    let err = launcher.run(&mut job, params.clone()).unwrap_err();
    assert!(matches!(err, BatchError::DuplicateRun { ref job, .. } if job == "job"));
    assert_eq!(log.lock().unwrap().len(), 1);
    assert_eq!(
        launcher.repository().status("job", &params),
        Some(BatchStatus::Completed)
    );
}

#[test]
fn failed_parameters_may_be_relaunched() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut failing = job(&[("step1", true)], &log);
    let mut fixed = job(&[("step1", false)], &log);
    let launcher = JobLauncher::default();
    let params = JobParametersBuilder::new().add_string("JobId", "1").build();

    let first = launcher.run(&mut failing, params.clone()).unwrap();
    assert_eq!(first.status, BatchStatus::Failed);
    let second = launcher.run(&mut fixed, params).unwrap();
    assert_eq!(second.status, BatchStatus::Completed);
    assert!(second.id > first.id);
}

#[test]
fn running_parameters_are_rejected() {
    let repository = JobRepository::new();
    let params = JobParametersBuilder::new().add_long("time", 1).build();
    repository.create_execution("job", &params).unwrap();
    assert_eq!(repository.status("job", &params), Some(BatchStatus::Started));
    assert!(repository.create_execution("job", &params).is_err());
    // another job may use the same parameters
    assert!(repository.create_execution("other", &params).is_ok());
    assert_eq!(repository.run_count(), 2);
}

#[test]
fn generated_launches_never_collide() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut job = job(&[("step1", false)], &log);
    let launcher = JobLauncher::new(Arc::new(JobRepository::new()));
    for _ in 0..20 {
        assert_eq!(launcher.launch(&mut job).unwrap().status, BatchStatus::Completed);
    }
    assert_eq!(launcher.repository().run_count(), 20);
}

#[test]
fn retention_bounds_the_remembered_runs() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut job = job(&[("step1", false)], &log);
    let launcher = JobLauncher::new(Arc::new(JobRepository::with_retention(3)));

    let first = launcher.launch(&mut job).unwrap();
    for _ in 0..9 {
        launcher.launch(&mut job).unwrap();
    }
    assert_eq!(launcher.repository().run_count(), 3);
    assert_eq!(launcher.repository().status("job", &first.parameters), None);
}

#[test]
fn retention_never_drops_a_running_run() {
    let repository = JobRepository::with_retention(1);
    let running = JobParametersBuilder::new().add_long("time", 1).build();
    repository.create_execution("job", &running).unwrap();

    for n in 2..6 {
        let params = JobParametersBuilder::new().add_long("time", n).build();
        repository.create_execution("job", &params).unwrap();
        repository.update_status("job", &params, BatchStatus::Completed);
    }

    assert_eq!(repository.status("job", &running), Some(BatchStatus::Started));
    assert!(repository.create_execution("job", &running).is_err());
    assert_eq!(repository.run_count(), 2);
}

#[test]
fn relaunched_failure_is_retained_once() {
    let repository = JobRepository::with_retention(2);
    let params = JobParametersBuilder::new().add_string("JobId", "x").build();
    repository.create_execution("job", &params).unwrap();
    repository.update_status("job", &params, BatchStatus::Failed);
    repository.create_execution("job", &params).unwrap();
    repository.update_status("job", &params, BatchStatus::Completed);

    let other = JobParametersBuilder::new().add_string("JobId", "y").build();
    repository.create_execution("job", &other).unwrap();
    repository.update_status("job", &other, BatchStatus::Completed);

    // both fit in a retention of two
    assert_eq!(repository.status("job", &params), Some(BatchStatus::Completed));
    assert_eq!(repository.status("job", &other), Some(BatchStatus::Completed));
}
