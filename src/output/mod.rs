//! Where the scheduler reports progress: a plain console or anything that
//! also renders probe activity.

mod console_sink;

pub use console_sink::ConsoleSink;

/// Receiver of scheduler progress.
///
/// Only called from the scheduler task.
pub trait OutputSink {
    /// A probe is about to run; `label` identifies a specific server.
    fn probe_started(&self, label: Option<&str>);
    /// The current probe finished, successfully or not.
    fn probe_ended(&self);
    /// An ordinary text line.
    fn line(&self, text: &str);
    /// A failure the user should know about.
    fn error(&self, text: &str);
}
