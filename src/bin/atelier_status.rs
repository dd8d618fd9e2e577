//! Prints the progress summary of a saved project as JSON.
//!
//! Usage:
//!
//! ```text
//! atelier-status <project-id> [config-path]
//! ```
//!
//! The snapshot is read from the configured state directory. Configuration
//! comes from the optional JSON file and `ATELIER_*` environment variables.
//! Logs go to standard error; the status document is written to standard
//! output:
//!
//! ```json
//! {
//!   "project_id": "9b1f6c1e-3b7a-4c1e-9d2a-2f61f0a4c8d1",
//!   "project_name": "Todo API",
//!   "phase": "implementation",
//!   "task_summary": {
//!     "pending": 3,
//!     "in_progress": 0,
//!     "blocked": 0,
//!     "in_review": 0,
//!     "completed": 3,
//!     "failed": 0
//!   },
//!   "total_tasks": 6,
//!   "progress_percentage": 50.0
//! }
//! ```

use atelier::config::AtelierConfig;
use atelier::project::domain::ProjectId;
use atelier::project::services::{ProjectRepository, ProjectStoreError};
use atelier::telemetry::{self, TelemetryError};
use camino::Utf8PathBuf;
use std::env;
use std::io::{self, Write};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Builder;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while reporting status.
#[derive(Debug, Error)]
enum StatusError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] atelier::config::ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to initialise async runtime: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error(transparent)]
    Store(#[from] ProjectStoreError),
    #[error("project not found: {0}")]
    NotFound(ProjectId),
    #[error("failed to encode status: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write status: {0}")]
    Output(#[source] io::Error),
}

fn main() -> Result<(), BoxError> {
    let args = collect_args()?;
    run(args.into_iter()).map_err(Into::into)
}

fn collect_args() -> Result<Vec<String>, StatusError> {
    env::args_os()
        .map(|arg_os| {
            arg_os
                .into_string()
                .map_err(|_| StatusError::InvalidArgs("argument is not valid UTF-8".into()))
        })
        .collect()
}

fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> Result<(ProjectId, Option<Utf8PathBuf>), StatusError> {
    let _program = args.next();
    let project_id = args
        .next()
        .ok_or_else(|| StatusError::InvalidArgs("missing project id argument".into()))
        .and_then(|arg| {
            uuid::Uuid::parse_str(arg.trim())
                .map(ProjectId::from_uuid)
                .map_err(|err| StatusError::InvalidArgs(format!("invalid project id {arg}: {err}")))
        })?;
    let config_path = args.next().map(Utf8PathBuf::from);
    if let Some(extra) = args.next() {
        return Err(StatusError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok((project_id, config_path))
}

fn run(args: impl Iterator<Item = String>) -> Result<(), StatusError> {
    let (project_id, config_path) = parse_args(args)?;
    let config = AtelierConfig::load(config_path.as_deref())?;
    telemetry::init(&config.log_filter)?;

    let store = config.open_store()?;
    let repository = ProjectRepository::new(Arc::new(store));
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(StatusError::RuntimeInit)?;

    let project = runtime
        .block_on(repository.load(project_id))?
        .ok_or(StatusError::NotFound(project_id))?;
    tracing::debug!(project_id = %project_id, state_dir = %config.state_dir, "loaded snapshot");

    let document = serde_json::to_string_pretty(&project.status())?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{document}").map_err(StatusError::Output)
}
