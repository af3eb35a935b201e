//! HTTP trigger for job runs.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/load/job` | Run the job with fresh parameters and return its terminal status |

use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::{error, info};

use crate::error::Result;
use crate::job::{Job, JobExecution, JobLauncher};

/// A job and the launcher that runs it, shared across requests.
///
/// Runs of the same job are serialized: its reader and writers are reused
/// from run to run. Every run still gets its own parameters.
#[derive(Debug)]
pub struct TriggerState {
    job: Mutex<Job>,
    launcher: JobLauncher,
}

impl TriggerState {
    pub fn new(job: Job, launcher: JobLauncher) -> Self {
        Self {
            job: Mutex::new(job),
            launcher,
        }
    }

    pub fn launcher(&self) -> &JobLauncher {
        &self.launcher
    }

    /// Run the job once, blocking until it finishes.
    pub fn launch(&self) -> Result<JobExecution> {
        let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
        self.launcher.launch(&mut job)
    }
}

/// Application state shared across all handlers.
pub type AppState = Arc<TriggerState>;

/// Creates the trigger router.
pub fn job_router(state: AppState) -> Router {
    Router::new()
        .route("/load/job", get(load_job))
        .with_state(state)
}

/// `GET /load/job`: run the job and return its terminal status.
async fn load_job(State(state): State<AppState>) -> Response {
    let joined = tokio::task::spawn_blocking(move || state.launch()).await;
    match joined {
        Ok(Ok(execution)) => {
            info!(execution = execution.id, status = %execution.status, "trigger finished");
            (StatusCode::OK, execution.status.to_string()).into_response()
        }
        Ok(Err(e)) => {
            error!(error = %e, "job could not be launched");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            error!(error = %e, "job run panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Serve the trigger router on `listener` until the process stops.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "serving job trigger");
    axum::serve(listener, job_router(state)).await
}
