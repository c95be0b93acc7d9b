//! autospeedtest library: scheduled speed measurements appended to a CSV log.

pub mod adapters;
pub mod config;
pub mod domain;
mod error;
pub mod fmt;
pub mod output;
pub mod services;

pub use adapters::csv_log::CsvLog;
pub use adapters::speedtest_cli::{Measure, SpeedtestCli};
pub use domain::measurement::{MeasurementResult, ProbeTarget};
pub use domain::schedule::ScheduleConfig;
pub use error::SpeedtestError;
pub use output::{ConsoleSink, OutputSink};
pub use services::scheduler::{Scheduler, SchedulerState, TickReport};
