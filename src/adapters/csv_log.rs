use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::measurement::MeasurementResult;
use crate::domain::schedule::ScheduleConfig;
use crate::error::SpeedtestError;
use crate::fmt::csv::{format_row, header_row};

/// Append-only CSV log of measurement results.
///
/// Holds no file handle: every call opens and closes the file on its own.
#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
    delimiter: char,
    decimal_separator: char,
}

impl CsvLog {
    pub fn new(path: impl Into<PathBuf>, delimiter: char, decimal_separator: char) -> Self {
        Self {
            path: path.into(),
            delimiter,
            decimal_separator,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(
            config.log_path.clone(),
            config.delimiter,
            config.decimal_separator,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log with its header row unless it already exists.
    ///
    /// Returns `true` when the file was created by this call.
    pub fn ensure_header(&self) -> Result<bool, SpeedtestError> {
        if self.path.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(self.write_error(e)),
        };
        file.write_all(header_row(self.delimiter).as_bytes())
            .map_err(|e| self.write_error(e))?;
        debug!(path = %self.path.display(), "created log with header");
        Ok(true)
    }

    /// Append one result as a new row.
    pub fn append(&self, result: &MeasurementResult) -> Result<(), SpeedtestError> {
        let row = format_row(result, self.delimiter, self.decimal_separator);
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;
        file.write_all(format!("\n{row}").as_bytes())
            .map_err(|e| self.write_error(e))?;
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> SpeedtestError {
        SpeedtestError::LogWrite {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::tempdir;

    fn sample(ping_ms: f64) -> MeasurementResult {
        MeasurementResult {
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            ping_ms,
            download_bps: 50_000_000.0,
            upload_bps: 10_000_000.0,
            server_name: "ExampleISP".into(),
            server_location: "ExampleCity".into(),
            server_url: "http://example.test".into(),
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempdir().unwrap();
        let log = CsvLog::new(dir.path().join("log.csv"), ';', '.');
        assert!(log.ensure_header().unwrap());
        assert!(!log.ensure_header().unwrap());
        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.matches("Time;Ping (ms)").count(), 1);
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let log = CsvLog::new(dir.path().join("a/b/c/log.csv"), ',', '.');
        log.ensure_header().unwrap();
        assert!(dir.path().join("a/b/c/log.csv").is_file());
    }

    #[test]
    fn test_append_rows_after_header() {
        let dir = tempdir().unwrap();
        let log = CsvLog::new(dir.path().join("log.csv"), ';', ',');
        log.ensure_header().unwrap();
        log.append(&sample(12.0)).unwrap();
        log.ensure_header().unwrap();
        log.append(&sample(13.25)).unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Time;"));
        assert!(lines[1].contains(";12,000;50,000;10,000;ExampleISP;"));
        assert!(lines[2].contains(";13,250;"));
        assert!(!content.ends_with('\n'));
    }

    #[test]
    fn test_existing_file_left_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "previous content").unwrap();
        let log = CsvLog::new(&path, ';', '.');
        assert!(!log.ensure_header().unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous content");
    }

    #[test]
    fn test_unwritable_path_reports_log_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let log = CsvLog::new(blocker.join("log.csv"), ';', '.');
        let err = log.ensure_header().expect_err("parent is a file");
        assert!(matches!(err, SpeedtestError::LogWrite { .. }));
        let err = log.append(&sample(1.0)).expect_err("parent is a file");
        assert!(matches!(err, SpeedtestError::LogWrite { .. }));
    }
}
