use std::ffi::OsString;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::domain::measurement::{MeasurementResult, ProbeTarget};
use crate::error::SpeedtestError;

pub const DEFAULT_PROGRAM: &str = "speedtest-cli";

/// `--timeout` bounds each HTTP request of the tool, not the whole run. A run
/// goes through several request phases, so the process as a whole gets this
/// many timeouts worth of wall clock before it is killed.
pub const WALL_CLOCK_FACTOR: u32 = 12;

/// Something that can take one measurement against a target.
pub trait Measure {
    fn measure(
        &self,
        target: ProbeTarget,
        timeout_secs: u32,
    ) -> impl Future<Output = Result<MeasurementResult, SpeedtestError>>;
}

/// Runs `speedtest-cli` (or a compatible program) in JSON mode.
#[derive(Debug, Clone)]
pub struct SpeedtestCli {
    program: OsString,
    deadline: Option<Duration>,
}

impl Default for SpeedtestCli {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl SpeedtestCli {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            deadline: None,
        }
    }

    /// Use a fixed wall-clock deadline instead of one derived from the timeout.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    /// Wall-clock budget for one run with the given per-request timeout.
    pub fn deadline_for(&self, timeout_secs: u32) -> Duration {
        self.deadline.unwrap_or_else(|| {
            Duration::from_secs(u64::from(timeout_secs) * u64::from(WALL_CLOCK_FACTOR))
        })
    }

    /// Command line arguments for one run.
    pub fn args(target: ProbeTarget, timeout_secs: u32) -> Vec<String> {
        let mut args = vec!["--json".to_string()];
        if let ProbeTarget::ServerId(id) = target {
            args.push("--server".into());
            args.push(id.to_string());
        }
        args.push("--secure".into());
        args.push("--timeout".into());
        args.push(timeout_secs.to_string());
        args
    }

    /// Make sure the program can be started at all.
    pub async fn check_available(&self) -> Result<(), SpeedtestError> {
        let unavailable = |source| SpeedtestError::ToolUnavailable {
            program: self.program.to_string_lossy().into_owned(),
            source,
        };
        let mut child = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(unavailable)?;
        match tokio::time::timeout(Duration::from_secs(10), child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "measurement tool answered --version"),
            Ok(Err(e)) => return Err(unavailable(e)),
            Err(_) => debug!("measurement tool did not answer --version in time"),
        }
        Ok(())
    }
}

impl Measure for SpeedtestCli {
    #[instrument(skip(self), fields(program = %self.program.to_string_lossy()))]
    async fn measure(
        &self,
        target: ProbeTarget,
        timeout_secs: u32,
    ) -> Result<MeasurementResult, SpeedtestError> {
        let child = Command::new(&self.program)
            .args(Self::args(target, timeout_secs))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpeedtestError::ProbeSpawn { target, source })?;

        let deadline = self.deadline_for(timeout_secs);
        // dropping the wait future on timeout kills the child
        let output = tokio::time::timeout(deadline, child.wait_with_output())
            .await
            .map_err(|_| SpeedtestError::ProbeTimeout {
                target,
                after: deadline,
            })?
            .map_err(|e| SpeedtestError::ProbeFailed {
                target,
                status: "unknown status".into(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let first = stderr
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("no error output");
            return Err(SpeedtestError::ProbeFailed {
                target,
                status: output.status.to_string(),
                stderr: first.to_string(),
            });
        }

        let result = parse_output(target, &output.stdout)?;
        debug!(ping_ms = result.ping_ms, download_bps = result.download_bps, "measurement parsed");
        Ok(result)
    }
}

#[derive(Deserialize)]
struct ToolOutput {
    ping: f64,
    download: f64,
    upload: f64,
    server: ToolServer,
    timestamp: String,
}

#[derive(Deserialize)]
struct ToolServer {
    sponsor: String,
    name: String,
    url: String,
}

/// Parse the JSON document printed by `speedtest-cli --json`.
///
/// Every field is required; a missing or mistyped field fails the whole
/// measurement.
pub fn parse_output(target: ProbeTarget, stdout: &[u8]) -> Result<MeasurementResult, SpeedtestError> {
    let invalid = |reason: String| SpeedtestError::ProbeParse { target, reason };
    let doc: ToolOutput = serde_json::from_slice(stdout).map_err(|e| invalid(e.to_string()))?;

    for (field, value) in [
        ("ping", doc.ping),
        ("download", doc.download),
        ("upload", doc.upload),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(format!("field `{field}` out of range: {value}")));
        }
    }
    let timestamp = parse_timestamp(&doc.timestamp)
        .ok_or_else(|| invalid(format!("bad timestamp '{}'", doc.timestamp)))?;

    Ok(MeasurementResult {
        timestamp,
        ping_ms: doc.ping,
        download_bps: doc.download,
        upload_bps: doc.upload,
        server_name: doc.server.sponsor,
        server_location: doc.server.name,
        server_url: doc.server.url,
    })
}

/// Parse "2024-01-01T12:00:02.123456Z" as UTC, dropping fractional seconds.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let whole = s.trim().split('.').next()?.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(whole, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
