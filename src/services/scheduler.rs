use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, instrument, warn};

use crate::adapters::csv_log::CsvLog;
use crate::adapters::speedtest_cli::Measure;
use crate::domain::measurement::{MeasurementResult, ProbeTarget};
use crate::domain::schedule::ScheduleConfig;
use crate::error::SpeedtestError;
use crate::fmt::text::render_result;
use crate::output::OutputSink;

/// Delay before the first tick after the scheduler is started.
pub const FIRST_TICK_DELAY: Duration = Duration::from_millis(2);

/// Shortest period the ticker accepts; shorter intervals are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not started, or stopped.
    Idle,
    /// Waiting for the next tick.
    Armed,
    /// Running the probes of the current tick.
    Ticking,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub probes: usize,
    pub logged: usize,
    pub failed: usize,
}

/// Fires at a fixed interval and runs every probe target one after another.
///
/// Ticks never overlap: the loop waits for a tick to finish before it looks at
/// the ticker again, and ticks missed meanwhile are skipped. At most one
/// measurement is in flight at any time.
pub struct Scheduler<'a, M, S> {
    config: &'a ScheduleConfig,
    invoker: M,
    log: &'a CsvLog,
    sink: &'a S,
    state: SchedulerState,
    ticks: u64,
}

impl<'a, M, S> Scheduler<'a, M, S>
where
    M: Measure,
    S: OutputSink,
{
    pub fn new(config: &'a ScheduleConfig, invoker: M, log: &'a CsvLog, sink: &'a S) -> Self {
        Self {
            config,
            invoker,
            log,
            sink,
            state: SchedulerState::Idle,
            ticks: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of ticks started so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn invoker(&self) -> &M {
        &self.invoker
    }

    /// Tick every `interval` until `shutdown` resolves.
    ///
    /// The first tick fires after [`FIRST_TICK_DELAY`]. A tick in progress
    /// when `shutdown` resolves is abandoned, which kills its measurement; the
    /// sink still sees the end of that probe.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let start = Instant::now() + FIRST_TICK_DELAY;
        let mut ticker = time::interval_at(start, self.config.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);
        self.state = SchedulerState::Armed;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    // run_tick only awaits between probe_started and probe_ended
                    if self.state == SchedulerState::Ticking {
                        self.sink.probe_ended();
                    }
                    break;
                }
                report = self.run_tick() => {
                    debug!(?report, "tick finished");
                }
            }
        }

        self.state = SchedulerState::Idle;
    }

    /// Run every effective probe target once, in order.
    #[instrument(skip(self), fields(tick = self.ticks + 1))]
    pub async fn run_tick(&mut self) -> TickReport {
        let resume = match self.state {
            SchedulerState::Idle => SchedulerState::Idle,
            _ => SchedulerState::Armed,
        };
        self.state = SchedulerState::Ticking;
        self.ticks += 1;
        let mut report = TickReport::default();

        for target in self.config.effective_targets() {
            report.probes += 1;
            self.sink.probe_started(target.label().as_deref());
            match self.probe(target).await {
                Ok(result) => {
                    report.logged += 1;
                    self.sink.line(&render_result(&result));
                }
                Err(e) => {
                    report.failed += 1;
                    warn!(%target, error = %e, "probe failed");
                    if e.is_probe_error() {
                        self.sink.error(&format!("measurement failed: {e}"));
                    } else {
                        self.sink.error(&format!("{target}: result not logged: {e}"));
                    }
                }
            }
            self.sink.probe_ended();
        }

        self.state = resume;
        report
    }

    async fn probe(&self, target: ProbeTarget) -> Result<MeasurementResult, SpeedtestError> {
        let result = self.invoker.measure(target, self.config.timeout_secs).await?;
        self.log.ensure_header()?;
        self.log.append(&result)?;
        Ok(result)
    }
}
