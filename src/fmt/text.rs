use console::style;
use std::time::Duration;

use crate::domain::measurement::MeasurementResult;
use crate::domain::schedule::ScheduleConfig;

/// Startup banner.
pub fn render_banner(version: &str) -> String {
    format!(
        "{} {}\n{}",
        style("AutoSpeedtest").cyan().bold(),
        style(version).green(),
        style("Periodic speed measurements logged to CSV").dim()
    )
}

/// One-line summary of a finished measurement.
pub fn render_result(r: &MeasurementResult) -> String {
    format!(
        "{done} {ping_lbl} {ping:.3}ms {down_lbl} {down:.3}Mbit/s {up_lbl} {up:.3}Mbit/s {srv_lbl} {srv} ({loc})",
        done = style("Speedtest done!").green().bold(),
        ping_lbl = style("Ping:").cyan().bold(),
        ping = r.ping_ms,
        down_lbl = style("Download:").cyan().bold(),
        down = r.download_mbit(),
        up_lbl = style("Upload:").cyan().bold(),
        up = r.upload_mbit(),
        srv_lbl = style("Server:").cyan().bold(),
        srv = style(&r.server_name).green(),
        loc = r.server_location,
    )
}

/// Describe what the scheduler is about to do.
pub fn render_schedule(cfg: &ScheduleConfig) -> String {
    let targets = if cfg.probe_targets.is_empty() {
        "best available server".to_string()
    } else {
        cfg.probe_targets
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "{lbl} {targets}\n{log_lbl} {log}\nRunning speedtest every {secs} seconds.\n",
        lbl = style("Targets:").cyan().bold(),
        log_lbl = style("Log file:").cyan().bold(),
        log = style(cfg.log_path.display()).green(),
        secs = cfg.interval.as_secs(),
    )
}

/// Human readable elapsed time, e.g. "34.2s".
pub fn render_elapsed(d: Duration) -> String {
    format!("{:.1}s", d.as_secs_f64())
}
