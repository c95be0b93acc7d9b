use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::measurement::ProbeTarget;

/// Top-level error type for the autospeedtest library.
#[derive(Error, Debug)]
pub enum SpeedtestError {
    /// A command line token that matches no recognized option.
    #[error("ignoring '{token}': {reason}")]
    ConfigParse { token: String, reason: String },
    /// The measurement tool could not be started at all.
    #[error("measurement tool '{program}' is not available: {source}")]
    ToolUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The measurement did not finish within its deadline.
    #[error("{target}: measurement timed out after {after:?}")]
    ProbeTimeout { target: ProbeTarget, after: Duration },
    /// The subprocess could not be spawned.
    #[error("{target}: failed to start measurement: {source}")]
    ProbeSpawn {
        target: ProbeTarget,
        #[source]
        source: std::io::Error,
    },
    /// The subprocess exited unsuccessfully.
    #[error("{target}: measurement tool exited with {status}: {stderr}")]
    ProbeFailed {
        target: ProbeTarget,
        status: String,
        stderr: String,
    },
    /// The tool's output did not match the expected schema.
    #[error("{target}: unreadable measurement output: {reason}")]
    ProbeParse { target: ProbeTarget, reason: String },
    /// Opening or writing the CSV log failed.
    #[error("log {}: {source}", .path.display())]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SpeedtestError {
    /// Whether the error is scoped to a single probe of a single tick.
    pub fn is_probe_error(&self) -> bool {
        matches!(
            self,
            SpeedtestError::ProbeTimeout { .. }
                | SpeedtestError::ProbeSpawn { .. }
                | SpeedtestError::ProbeFailed { .. }
                | SpeedtestError::ProbeParse { .. }
        )
    }
}
