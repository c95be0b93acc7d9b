use std::path::PathBuf;
use std::time::Duration;

use super::measurement::ProbeTarget;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3600);
pub const DEFAULT_TIMEOUT_SECS: u32 = 10;
pub const DEFAULT_DELIMITER: char = ';';
pub const DEFAULT_DECIMAL_SEPARATOR: char = '.';
pub const DEFAULT_LOG_PATH: &str = "speedtest-log.csv";

/// Resolved schedule: what to probe, how often and where to log it.
///
/// Built once before the scheduler starts, whichever source produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleConfig {
    /// Probes per tick, in order. Empty means a single best-available probe.
    pub probe_targets: Vec<ProbeTarget>,
    pub interval: Duration,
    /// Per-request timeout handed to the measurement tool.
    pub timeout_secs: u32,
    pub delimiter: char,
    pub decimal_separator: char,
    pub log_path: PathBuf,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            probe_targets: Vec::new(),
            interval: DEFAULT_INTERVAL,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            delimiter: DEFAULT_DELIMITER,
            decimal_separator: DEFAULT_DECIMAL_SEPARATOR,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

impl ScheduleConfig {
    /// Targets to run on every tick.
    pub fn effective_targets(&self) -> Vec<ProbeTarget> {
        if self.probe_targets.is_empty() {
            vec![ProbeTarget::BestAvailable]
        } else {
            self.probe_targets.clone()
        }
    }

    /// Delimiter and decimal separator are the same character, which makes
    /// numeric columns ambiguous.
    pub fn separator_clash(&self) -> bool {
        self.delimiter == self.decimal_separator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ScheduleConfig::default();
        assert_eq!(cfg.interval, Duration::from_secs(3600));
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(cfg.delimiter, ';');
        assert_eq!(cfg.decimal_separator, '.');
        assert_eq!(cfg.log_path, PathBuf::from("speedtest-log.csv"));
        assert!(cfg.probe_targets.is_empty());
        assert!(!cfg.separator_clash());
    }

    #[test]
    fn test_effective_targets() {
        let mut cfg = ScheduleConfig::default();
        assert_eq!(cfg.effective_targets(), vec![ProbeTarget::BestAvailable]);
        cfg.probe_targets = vec![ProbeTarget::ServerId(1), ProbeTarget::ServerId(2)];
        assert_eq!(
            cfg.effective_targets(),
            vec![ProbeTarget::ServerId(1), ProbeTarget::ServerId(2)]
        );
    }
}
