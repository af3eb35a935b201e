use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use batchfan::{BatchBuilder, BatchConfig, BatchStatus, JobLauncher, SqliteSource};
use tracing_subscriber::EnvFilter;

fn print_usage_and_exit() -> ! {
    eprintln!("Usage: batchfan_run <database.sqlite> [config.yaml|config.json]");
    std::process::exit(1);
}

fn run() -> Result<BatchStatus, Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);

    let db_path = match args.next() {
        Some(p) => PathBuf::from(p),
        None => return Err("missing <database.sqlite> argument".into()),
    };

    let config = match args.next() {
        Some(p) => BatchConfig::from_path(&PathBuf::from(p))?,
        None => BatchConfig::default(),
    };

    if args.next().is_some() {
        return Err("too many arguments".into());
    }

    let source = SqliteSource::open(&db_path)?;
    let mut job = BatchBuilder::new(config)
        .with_source(Arc::new(source))
        .build()?;

    let execution = JobLauncher::default().launch(&mut job)?;

    println!("JobExecution: {}", execution.status);
    for step in &execution.step_executions {
        for output in &step.outputs {
            println!(
                "{} -> {} ({} lines)",
                output.destination,
                output.target.as_deref().unwrap_or("-"),
                output.lines
            );
        }
    }
    for failure in &execution.failures {
        eprintln!("failure: {failure}");
    }

    Ok(execution.status)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(BatchStatus::Completed) => {}
        // Non-zero exit so scripts can detect a failed run.
        Ok(_) => std::process::exit(2),
        Err(e) => {
            eprintln!("batchfan_run error: {e}");
            print_usage_and_exit();
        }
    }
}
