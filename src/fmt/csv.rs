use chrono::{Local, TimeZone};
use std::fmt::Display;

use crate::domain::measurement::MeasurementResult;

/// Column titles of the log file, in order.
pub const HEADER: [&str; 7] = [
    "Time",
    "Ping (ms)",
    "Download rate (Mbit/s)",
    "Upload rate (Mbit/s)",
    "Server",
    "Location",
    "URL",
];

/// Header row joined with `delimiter`, without line terminator.
pub fn header_row(delimiter: char) -> String {
    HEADER.join(delimiter.to_string().as_str())
}

/// Serialize a result as one CSV row in the local time zone.
pub fn format_row(r: &MeasurementResult, delimiter: char, decimal_separator: char) -> String {
    format_row_in(&Local, r, delimiter, decimal_separator)
}

/// Serialize a result as one CSV row with timestamps shown in `tz`.
///
/// Text columns are written verbatim; a delimiter inside them is not escaped.
pub fn format_row_in<Tz>(
    tz: &Tz,
    r: &MeasurementResult,
    delimiter: char,
    decimal_separator: char,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time = r.timestamp.with_timezone(tz).format("%Y-%m-%d %H:%M:%S");
    let columns = [
        time.to_string(),
        decimal(r.ping_ms, decimal_separator),
        decimal(r.download_mbit(), decimal_separator),
        decimal(r.upload_mbit(), decimal_separator),
        r.server_name.clone(),
        r.server_location.clone(),
        r.server_url.clone(),
    ];
    columns.join(delimiter.to_string().as_str())
}

/// Three fractional digits with the given decimal separator.
pub fn decimal(value: f64, separator: char) -> String {
    let s = format!("{value:.3}");
    if separator == '.' {
        s
    } else {
        s.replace('.', &separator.to_string())
    }
}
