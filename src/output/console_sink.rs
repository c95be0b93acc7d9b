use std::cell::Cell;
use std::time::Instant;

use console::{Term, style};

use super::OutputSink;
use crate::fmt::text::render_elapsed;

/// Writes progress to the terminal.
///
/// On an interactive terminal the "Running speedtest" status stays on one
/// line that is cleared as soon as the probe reports anything. Otherwise every
/// status is a plain line, which keeps redirected output readable.
pub struct ConsoleSink {
    term: Term,
    status_line: bool,
    showing_status: Cell<bool>,
    started: Cell<Option<Instant>>,
}

impl ConsoleSink {
    pub fn new(term: Term) -> Self {
        let status_line = term.is_term();
        Self {
            term,
            status_line,
            showing_status: Cell::new(false),
            started: Cell::new(None),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Term::stdout())
    }

    /// Force the transient status line on or off.
    pub fn with_status_line(mut self, enabled: bool) -> Self {
        self.status_line = enabled;
        self
    }

    fn clear_status(&self) {
        if self.showing_status.replace(false) {
            self.term.clear_line().ok();
        }
    }
}

impl OutputSink for ConsoleSink {
    fn probe_started(&self, label: Option<&str>) {
        self.clear_status();
        self.started.set(Some(Instant::now()));
        let text = match label {
            Some(label) => format!("Running speedtest {label}..."),
            None => "Running speedtest...".to_string(),
        };
        let text = style(text).bold().to_string();
        if self.status_line {
            if self.term.write_str(&text).is_ok() {
                self.showing_status.set(true);
            }
        } else {
            self.term.write_line(&text).ok();
        }
    }

    fn probe_ended(&self) {
        self.clear_status();
        if let Some(started) = self.started.take() {
            if self.status_line {
                let took = format!("(took {})", render_elapsed(started.elapsed()));
                self.term.write_line(&style(took).dim().to_string()).ok();
            }
        }
    }

    fn line(&self, text: &str) {
        self.clear_status();
        self.term.write_line(text).ok();
    }

    fn error(&self, text: &str) {
        self.clear_status();
        self.term
            .write_line(&style(format!("Error: {text}")).red().to_string())
            .ok();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use console::strip_ansi_codes;
    use std::fs::{self, File};
    use std::path::Path;
    use tempfile::tempdir;

    fn file_term(path: &Path) -> Term {
        let write = File::create(path).unwrap();
        let read = File::open(path).unwrap();
        Term::read_write_pair(read, write)
    }

    fn read(path: &Path) -> String {
        strip_ansi_codes(&fs::read_to_string(path).unwrap()).into_owned()
    }

    #[test]
    fn test_status_line_is_cleared() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out");
        let sink = ConsoleSink::new(file_term(&path)).with_status_line(true);

        sink.probe_started(Some("#7"));
        sink.line("Speedtest done!");
        sink.probe_ended();

        let out = read(&path);
        assert!(!out.contains("Running speedtest #7...\n"));
        let status = out.find("Running speedtest #7...").unwrap();
        let clear = out.find("\r").unwrap();
        let done = out.find("Speedtest done!\n").unwrap();
        assert!(status < clear && clear < done);
        assert!(out.contains("(took "));
    }

    #[test]
    fn test_error_clears_status_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out");
        let sink = ConsoleSink::new(file_term(&path)).with_status_line(true);

        sink.probe_started(None);
        sink.error("measurement failed");
        sink.probe_ended();

        let out = read(&path);
        assert_eq!(out.matches('\r').count(), 1);
        assert!(out.contains("Error: measurement failed\n"));
    }

    #[test]
    fn test_plain_lines_without_terminal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out");
        let sink = ConsoleSink::new(file_term(&path));

        sink.probe_started(Some("#11"));
        sink.line("Speedtest done!");
        sink.probe_ended();

        let out = read(&path);
        assert_eq!(out, "Running speedtest #11...\nSpeedtest done!\n");
    }
}
