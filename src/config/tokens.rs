use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::domain::measurement::ProbeTarget;
use crate::domain::schedule::ScheduleConfig;
use crate::error::SpeedtestError;

/// Outcome of resolving command line tokens.
#[derive(Debug)]
pub struct Resolution {
    pub config: ScheduleConfig,
    /// `gui:true` was given: ask for the settings interactively.
    pub gui: bool,
    /// Tokens that were ignored, with the reason.
    pub rejected: Vec<SpeedtestError>,
}

/// Resolve `key:value` tokens into a [`ScheduleConfig`].
///
/// Supported forms (any number of leading dashes is ignored):
/// - "timeout:10"
/// - "servers:1234" / "servers:1234,5678"
/// - "log:logs/speed.csv"
/// - "interval:30" / "interval:15m" (suffix s, m, h or d; seconds by default)
/// - "decimalSeparator:,"
/// - "delimiter:;"
/// - "gui:true"
///
/// Tokens that match nothing never abort resolution: they land in
/// [`Resolution::rejected`] and the previous value is kept.
pub fn resolve_tokens<I, S>(tokens: I) -> Resolution
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config = ScheduleConfig::default();
    let mut gui = false;
    let mut rejected = Vec::new();

    for raw in tokens {
        let raw = raw.as_ref();
        if let Err(e) = apply_token(raw, &mut config, &mut gui) {
            debug!(token = raw, "{e}");
            rejected.push(e);
        }
    }

    Resolution {
        config,
        gui,
        rejected,
    }
}

fn apply_token(
    raw: &str,
    config: &mut ScheduleConfig,
    gui: &mut bool,
) -> Result<(), SpeedtestError> {
    let token = raw.trim().trim_start_matches('-');
    let reject = |reason: &str| SpeedtestError::ConfigParse {
        token: raw.to_string(),
        reason: reason.to_string(),
    };
    let Some((key, value)) = token.split_once(':') else {
        return Err(reject("expected key:value"));
    };

    match key {
        "timeout" => {
            config.timeout_secs =
                parse_positive(value).ok_or_else(|| reject("timeout must be a positive integer"))?;
        }
        "servers" => {
            config.probe_targets = parse_servers(value)
                .ok_or_else(|| reject("servers must be a comma separated list of ids"))?;
        }
        "log" => {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(reject("log path must be non-empty and contain no whitespace"));
            }
            config.log_path = PathBuf::from(value);
        }
        "interval" => {
            config.interval = parse_interval(value).ok_or_else(|| {
                reject("interval must be a positive integer with optional s, m, h or d suffix")
            })?;
        }
        "decimalSeparator" => match single_char(value) {
            Some(c @ ('.' | ',')) => config.decimal_separator = c,
            _ => return Err(reject("decimal separator must be '.' or ','")),
        },
        "delimiter" => {
            config.delimiter =
                single_char(value).ok_or_else(|| reject("delimiter must be a single character"))?;
        }
        "gui" => match value {
            "true" => *gui = true,
            "false" => *gui = false,
            _ => return Err(reject("gui must be true or false")),
        },
        _ => return Err(reject("unknown option")),
    }
    Ok(())
}

fn parse_positive(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok().filter(|&n| n > 0)
}

fn parse_servers(s: &str) -> Option<Vec<ProbeTarget>> {
    s.split(',')
        .map(|id| {
            if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            id.parse::<u32>().ok().map(ProbeTarget::ServerId)
        })
        .collect()
}

/// Parse "<n>[s|m|h|d]" into a duration.
pub fn parse_interval(s: &str) -> Option<Duration> {
    let (digits, unit_secs) = match s.char_indices().last()? {
        (i, 's') => (&s[..i], 1),
        (i, 'm') => (&s[..i], 60),
        (i, 'h') => (&s[..i], 3600),
        (i, 'd') => (&s[..i], 86_400),
        _ => (s, 1),
    };
    let n = parse_positive(digits)?;
    u64::from(n).checked_mul(unit_secs).map(Duration::from_secs)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_whitespace() => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_units() {
        assert_eq!(parse_interval("30"), Some(Duration::from_millis(30 * 1000)));
        assert_eq!(parse_interval("45s"), Some(Duration::from_secs(45)));
        assert_eq!(parse_interval("250m"), Some(Duration::from_millis(250 * 60 * 1000)));
        assert_eq!(parse_interval("3h"), Some(Duration::from_secs(3 * 3600)));
        assert_eq!(parse_interval("2d"), Some(Duration::from_millis(2 * 86_400 * 1000)));
    }

    #[test]
    fn test_interval_rejects_garbage() {
        assert_eq!(parse_interval(""), None);
        assert_eq!(parse_interval("m"), None);
        assert_eq!(parse_interval("0"), None);
        assert_eq!(parse_interval("-5"), None);
        assert_eq!(parse_interval("5w"), None);
        assert_eq!(parse_interval("1.5h"), None);
    }

    #[test]
    fn test_full_token_set() {
        let res = resolve_tokens([
            "--timeout:20",
            "servers:1234,5678",
            "-log:out/speed.csv",
            "interval:15m",
            "decimalSeparator:,",
            "delimiter:\t",
        ]);
        // a tab is whitespace and therefore rejected
        assert_eq!(res.rejected.len(), 1);
        let cfg = res.config;
        assert_eq!(cfg.timeout_secs, 20);
        assert_eq!(
            cfg.probe_targets,
            vec![ProbeTarget::ServerId(1234), ProbeTarget::ServerId(5678)]
        );
        assert_eq!(cfg.log_path, PathBuf::from("out/speed.csv"));
        assert_eq!(cfg.interval, Duration::from_secs(900));
        assert_eq!(cfg.decimal_separator, ',');
        assert_eq!(cfg.delimiter, ';');
        assert!(!res.gui);
    }

    #[test]
    fn test_invalid_tokens_keep_defaults() {
        let res = resolve_tokens([
            "timeout:abc",
            "servers:",
            "servers:1,,2",
            "interval:0",
            "decimalSeparator:;",
            "delimiter:ab",
            "verbose",
            "color:red",
            "gui:maybe",
        ]);
        assert_eq!(res.config, ScheduleConfig::default());
        assert_eq!(res.rejected.len(), 9);
        assert!(
            res.rejected
                .iter()
                .all(|e| matches!(e, SpeedtestError::ConfigParse { .. }))
        );
    }

    #[test]
    fn test_later_tokens_win() {
        let res = resolve_tokens(["timeout:5", "timeout:7", "gui:true", "delimiter:,"]);
        assert_eq!(res.config.timeout_secs, 7);
        assert_eq!(res.config.delimiter, ',');
        assert!(res.gui);
        assert!(res.rejected.is_empty());
    }

    #[test]
    fn test_servers_keep_order() {
        let res = resolve_tokens(["servers:2,1,3"]);
        assert_eq!(
            res.config.probe_targets,
            vec![
                ProbeTarget::ServerId(2),
                ProbeTarget::ServerId(1),
                ProbeTarget::ServerId(3)
            ]
        );
    }
}
