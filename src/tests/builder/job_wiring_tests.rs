//! Tests for the batch builder and the reference job end to end.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::builder::BatchBuilder;
use crate::classify::FnClassifier;
use crate::config::{BatchConfig, OutputConfig};
use crate::error::BatchError;
use crate::format::{FormatKind, JsonLinesFormat, LineFormat};
use crate::io::MemoryResolver;
use crate::job::{BatchStatus, JobLauncher};
use crate::record::{Record, RawRow};
use crate::source::InMemoryTable;
use crate::tests::support::{CountingStream, customers};

fn two_customers() -> InMemoryTable {
    InMemoryTable::customers(
        "customer",
        &[(1, "A", "X", "1990-01-01"), (2, "B", "Y", "1991-02-02")],
    )
}

fn parsed(lines: Vec<String>) -> Vec<Record> {
    lines
        .iter()
        .map(|line| JsonLinesFormat.parse(line).unwrap())
        .collect()
}

#[test]
fn reference_job_splits_customers_by_parity() {
    let resolver = MemoryResolver::new();
    let mut job = BatchBuilder::default()
        .with_source(Arc::new(two_customers()))
        .with_resolver(Arc::new(resolver.clone()))
        .build()
        .unwrap();
    assert_eq!(job.name(), "job");
    assert_eq!(job.step_names(), vec!["step1"]);

    let execution = JobLauncher::default().launch(&mut job).unwrap();
    assert_eq!(execution.status, BatchStatus::Completed);

    assert_eq!(
        parsed(resolver.sink("EVEN").lines()),
        vec![Record::new(2, "B", "Y", "1991-02-02")]
    );
    assert_eq!(
        parsed(resolver.sink("ODD").lines()),
        vec![Record::new(1, "A", "X", "1990-01-01")]
    );

    let step = execution.step("step1").unwrap();
    assert_eq!(step.read_count, 2);
    assert_eq!(step.commit_count, 1);
    assert_eq!(step.output("EVEN").map(|o| o.lines), Some(1));
}

#[test]
fn every_record_lands_in_exactly_one_file_in_descending_order() {
    let resolver = MemoryResolver::new();
    let mut job = BatchBuilder::new(BatchConfig::default().with_fetch_size(7).with_chunk_size(4))
        .with_source(Arc::new(customers(53)))
        .with_resolver(Arc::new(resolver.clone()))
        .build()
        .unwrap();

    let execution = JobLauncher::default().launch(&mut job).unwrap();
    assert_eq!(execution.status, BatchStatus::Completed);

    let even: Vec<i64> = parsed(resolver.sink("EVEN").lines()).iter().map(Record::id).collect();
    let odd: Vec<i64> = parsed(resolver.sink("ODD").lines()).iter().map(Record::id).collect();
    assert_eq!(even, (1..=53).rev().filter(|id| id % 2 == 0).collect::<Vec<_>>());
    assert_eq!(odd, (1..=53).rev().filter(|id| id % 2 != 0).collect::<Vec<_>>());
    assert_eq!(execution.step("step1").map(|s| s.commit_count), Some(14));
}

#[test]
fn repeated_runs_produce_identical_output() {
    let table = Arc::new(customers(12));
    let resolver = MemoryResolver::new();
    let mut job = BatchBuilder::default()
        .with_source(table)
        .with_resolver(Arc::new(resolver.clone()))
        .build()
        .unwrap();
    let launcher = JobLauncher::default();

    launcher.launch(&mut job).unwrap();
    let first = (resolver.sink("EVEN").contents(), resolver.sink("ODD").contents());
    let second_run = launcher.launch(&mut job).unwrap();
    assert_eq!(second_run.status, BatchStatus::Completed);
    let second = (resolver.sink("EVEN").contents(), resolver.sink("ODD").contents());

    assert_eq!(first, second);
    assert_eq!(launcher.repository().run_count(), 2);
}

#[test]
fn unmappable_row_fails_the_job_and_commits_nothing_from_its_chunk() {
    let table = customers(3);
    table.insert(RawRow::new().with("id", "not a number"));
    let resolver = MemoryResolver::new();
    let mut job = BatchBuilder::default()
        .with_source(Arc::new(table))
        .with_resolver(Arc::new(resolver.clone()))
        .build()
        .unwrap();

    let execution = JobLauncher::default().launch(&mut job).unwrap();
    assert_eq!(execution.status, BatchStatus::Failed);
    assert!(execution.failures[0].contains("cannot map row"));
    assert!(resolver.sink("EVEN").lines().is_empty());
    assert!(resolver.sink("ODD").lines().is_empty());
}

#[test]
fn custom_classifier_gets_one_destination_per_key() {
    let resolver = MemoryResolver::new();
    let classifier = FnClassifier::new(vec!["A", "B"], |r: &Record| {
        if r.first_name() == "A" { "A" } else { "B" }
    });
    let mut job = BatchBuilder::default()
        .with_source(Arc::new(two_customers()))
        .with_resolver(Arc::new(resolver.clone()))
        .build_with(classifier)
        .unwrap();

    JobLauncher::default().launch(&mut job).unwrap();
    assert_eq!(resolver.sink("A").lines().len(), 1);
    assert_eq!(resolver.sink("B").lines().len(), 1);
}

#[test]
fn delimited_format_from_config() {
    let resolver = MemoryResolver::new();
    let config = BatchConfig::default()
        .with_format(FormatKind::Delimited)
        .with_delimiter(';');
    let mut job = BatchBuilder::new(config)
        .with_source(Arc::new(two_customers()))
        .with_resolver(Arc::new(resolver.clone()))
        .build()
        .unwrap();

    JobLauncher::default().launch(&mut job).unwrap();
    assert_eq!(resolver.sink("EVEN").lines(), vec!["2;B;Y;1991-02-02"]);
}

#[test]
fn temp_output_config_writes_real_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = BatchConfig::default().with_output(OutputConfig::Temp {
        dir: Some(dir.path().to_path_buf()),
        prefix: "customerOutput".into(),
        suffix: ".out".into(),
    });
    let mut job = BatchBuilder::new(config)
        .with_source(Arc::new(two_customers()))
        .build()
        .unwrap();

    let execution = JobLauncher::default().launch(&mut job).unwrap();
    let step = execution.step("step1").unwrap();
    let even = step.output("EVEN").and_then(|o| o.target.clone()).unwrap();
    let text = std::fs::read_to_string(&even).unwrap();
    assert_eq!(
        parsed(text.lines().map(str::to_string).collect()),
        vec![Record::new(2, "B", "Y", "1991-02-02")]
    );
}

#[test]
fn extra_streams_share_the_step_lifecycle() {
    let stream = CountingStream::default();
    let (opened, closed) = (stream.opened.clone(), stream.closed.clone());
    let mut job = BatchBuilder::default()
        .with_source(Arc::new(two_customers()))
        .with_resolver(Arc::new(MemoryResolver::new()))
        .add_stream(Box::new(stream))
        .build()
        .unwrap();

    JobLauncher::default().launch(&mut job).unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 1);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_source_or_bad_config_is_rejected() {
    assert!(matches!(
        BatchBuilder::default().build(),
        Err(BatchError::Config(_))
    ));
    assert!(matches!(
        BatchBuilder::new(BatchConfig::default().with_chunk_size(0))
            .with_source(Arc::new(two_customers()))
            .build(),
        Err(BatchError::Config(_))
    ));
}
