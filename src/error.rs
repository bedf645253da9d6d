//! Error taxonomy for planning, triggering and completing archive jobs
//!
//! Tool failures are not errors here: a non-zero exit is a normal terminal
//! job state (`Failed`) carrying classified diagnostics.

use crate::job::JobId;
use std::path::PathBuf;
use thiserror::Error;

/// The selection could not be turned into a job request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("No file selected")]
    EmptySelection,

    #[error("Select exactly one file ({0} selected)")]
    MultipleSelection(usize),

    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("Unsupported file kind (expected .tex or .fls): {0}")]
    UnsupportedFileKind(PathBuf),

    #[error("File has no containing directory: {0}")]
    NoParentDirectory(PathBuf),
}

/// A trigger was refused before any job was created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("An archive job for {path} is already running")]
    AlreadyRunning { path: PathBuf, job_id: JobId },
}

/// A completion event or intent did not apply to any live job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Unknown job {0}")]
    UnknownJob(JobId),

    #[error("Job {0} is not running")]
    NotRunning(JobId),

    #[error("Job {0} is still running")]
    StillRunning(JobId),

    #[error("No archive job for {0}")]
    NoJob(PathBuf),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Invalid classification pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}
