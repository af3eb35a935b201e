use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use batchfan::server::{TriggerState, serve};
use batchfan::{BatchBuilder, BatchConfig, JobLauncher, JobRepository, SqliteSource};
use tracing_subscriber::EnvFilter;

/// Finished runs remembered for duplicate detection.
const RUN_RETENTION: usize = 10_000;

fn usage() -> String {
    "Usage: batchfan_server <database.sqlite> [listen-addr] [config.yaml|config.json]".into()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let db_path = PathBuf::from(args.next().ok_or_else(usage)?);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:8080".to_string());
    let config = match args.next() {
        Some(p) => BatchConfig::from_path(&PathBuf::from(p))?,
        None => BatchConfig::default(),
    };

    let source = SqliteSource::open(&db_path)?;
    let job = BatchBuilder::new(config)
        .with_source(Arc::new(source))
        .build()?;

    let launcher = JobLauncher::new(Arc::new(JobRepository::with_retention(RUN_RETENTION)));
    let state = Arc::new(TriggerState::new(job, launcher));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve(listener, state).await?;
    Ok(())
}
