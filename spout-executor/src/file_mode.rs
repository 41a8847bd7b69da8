//! One-shot execution: invoke a single handler and write its return value to
//! a result file.
//!
//! There is no recovery path. Load, invocation and write errors propagate to
//! the caller, which terminates the process.

use std::path::PathBuf;

use serde_json::Value;
use spout_core::{env_value, HandlerLoader, Invocation};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum FileModeError {
    #[error(transparent)]
    Invocation(#[from] spout_core::Error),

    #[error("Failed to write result file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single file-mode job, usually read from the environment
#[derive(Debug, Clone)]
pub struct FileJob {
    pub handler: String,
    pub handler_dir: PathBuf,
    pub result_file: PathBuf,
    pub params: Value,
    pub context: Value,
}

impl FileJob {
    /// Build a job from raw environment values, applying the absent-value rule
    /// to `params` and `context`
    pub fn from_env_values(
        handler: String,
        handler_dir: PathBuf,
        result_file: PathBuf,
        params: Option<&str>,
        context: Option<&str>,
    ) -> Self {
        Self {
            handler,
            handler_dir,
            result_file,
            params: env_value(params),
            context: env_value(context),
        }
    }
}

/// Invoke the job's handler once and overwrite the result file with the
/// JSON encoding of its return value
pub fn run(loader: &dyn HandlerLoader, job: FileJob) -> Result<(), FileModeError> {
    let invocation = Invocation::new(job.handler, job.handler_dir, job.params, job.context);
    let outcome = spout_core::invoke(loader, invocation)?;

    let encoded = serde_json::to_string(&outcome.value).map_err(spout_core::Error::from)?;
    std::fs::write(&job.result_file, encoded).map_err(|source| FileModeError::Write {
        path: job.result_file.clone(),
        source,
    })?;

    info!(
        result_file = %job.result_file.display(),
        duration_secs = outcome.duration.as_secs_f64(),
        "Wrote handler result"
    );

    Ok(())
}
