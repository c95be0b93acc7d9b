use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use console::style;

use crate::domain::measurement::ProbeTarget;
use crate::domain::schedule::ScheduleConfig;

use super::tokens::parse_interval;

/// A source of schedule settings other than command line tokens, such as a
/// settings dialog.
pub trait SettingsSource {
    fn probe_targets(&self) -> Vec<ProbeTarget>;
    fn log_path(&self) -> PathBuf;
    fn interval(&self) -> Duration;
    fn timeout_secs(&self) -> u32;
    fn delimiter(&self) -> char;
    fn decimal_separator(&self) -> char;
}

impl ScheduleConfig {
    /// Build a schedule from any settings source.
    pub fn from_source(source: &impl SettingsSource) -> Self {
        Self {
            probe_targets: source.probe_targets(),
            interval: source.interval(),
            timeout_secs: source.timeout_secs(),
            delimiter: source.delimiter(),
            decimal_separator: source.decimal_separator(),
            log_path: source.log_path(),
        }
    }
}

/// Settings collected by asking on the terminal.
#[derive(Debug, Clone)]
pub struct PromptSettings {
    answers: ScheduleConfig,
}

impl PromptSettings {
    /// Ask for every setting, offering `initial` as the default answer.
    ///
    /// An empty answer keeps the default; an invalid one is asked again.
    /// Running out of input is an error.
    pub fn ask<R: BufRead, W: Write>(
        input: &mut R,
        output: &mut W,
        initial: &ScheduleConfig,
    ) -> io::Result<Self> {
        let mut answers = initial.clone();
        writeln!(output, "{}", style("Speedtest settings").bold())?;

        answers.probe_targets = prompt(
            input,
            output,
            "Server ids (comma separated, - for best available)",
            &render_targets(&initial.probe_targets),
            |s: &str| -> Option<Vec<ProbeTarget>> {
                if s == "-" {
                    return Some(Vec::new());
                }
                s.split(',')
                    .map(|id| id.trim().parse::<u32>().ok().map(ProbeTarget::ServerId))
                    .collect()
            },
        )?;
        answers.log_path = prompt(
            input,
            output,
            "Log file",
            &initial.log_path.display().to_string(),
            |s| Some(Path::new(s).to_path_buf()),
        )?;
        answers.interval = prompt(
            input,
            output,
            "Interval (e.g. 30m, 1h)",
            &format!("{}s", initial.interval.as_secs()),
            parse_interval,
        )?;
        answers.timeout_secs = prompt(
            input,
            output,
            "Timeout in seconds",
            &initial.timeout_secs.to_string(),
            |s| s.parse::<u32>().ok().filter(|&n| n > 0),
        )?;
        answers.delimiter = prompt(
            input,
            output,
            "CSV delimiter",
            &initial.delimiter.to_string(),
            single_char,
        )?;
        answers.decimal_separator = prompt(
            input,
            output,
            "Decimal separator (. or ,)",
            &initial.decimal_separator.to_string(),
            |s| single_char(s).filter(|&c| matches!(c, '.' | ',')),
        )?;

        Ok(Self { answers })
    }
}

impl SettingsSource for PromptSettings {
    fn probe_targets(&self) -> Vec<ProbeTarget> {
        self.answers.probe_targets.clone()
    }

    fn log_path(&self) -> PathBuf {
        self.answers.log_path.clone()
    }

    fn interval(&self) -> Duration {
        self.answers.interval
    }

    fn timeout_secs(&self) -> u32 {
        self.answers.timeout_secs
    }

    fn delimiter(&self) -> char {
        self.answers.delimiter
    }

    fn decimal_separator(&self) -> char {
        self.answers.decimal_separator
    }
}

fn prompt<R, W, T, F>(
    input: &mut R,
    output: &mut W,
    question: &str,
    default: &str,
    parse: F,
) -> io::Result<T>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> Option<T>,
{
    loop {
        write!(
            output,
            "{} [{}]: ",
            style(question).cyan().bold(),
            style(default).green()
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no answer for '{question}'"),
            ));
        }
        let answer = line.trim_end_matches(['\r', '\n']);
        let answer = if answer.trim().is_empty() { default } else { answer.trim() };
        match parse(answer) {
            Some(value) => return Ok(value),
            None => writeln!(output, "{}", style(format!("Invalid value: '{answer}'")).red())?,
        }
    }
}

fn render_targets(targets: &[ProbeTarget]) -> String {
    if targets.is_empty() {
        return "-".into();
    }
    targets
        .iter()
        .filter_map(|t| match t {
            ProbeTarget::ServerId(id) => Some(id.to_string()),
            ProbeTarget::BestAvailable => None,
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
