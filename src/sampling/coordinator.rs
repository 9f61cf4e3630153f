use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{CompletionReason, CoordinatorState, MonitorReport, Outcome};
use crate::rollup::{SampleSource, SourceError};
use crate::series::{MemorySample, MemorySeries, Metric};

/// Shortest sampling period the timer is armed with.
pub const MIN_PERIOD: Duration = Duration::from_micros(1);
/// Longest sampling period the timer is armed with.
pub const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Converts a sampling frequency in Hz into the timer period.
///
/// The frequency is validated upstream; out-of-range periods are clamped to
/// [`MIN_PERIOD`]..=[`MAX_PERIOD`].
pub fn period_for(frequency: f64) -> Duration {
    Duration::try_from_secs_f64(frequency.recip())
        .unwrap_or(MAX_PERIOD)
        .clamp(MIN_PERIOD, MAX_PERIOD)
}

/// Races a sampling timer against child termination and external cancellation.
///
/// Every loop iteration handles exactly one event. When several are ready at
/// once, cancellation wins over child termination, which wins over the tick.
/// Reads run on the blocking pool and are awaited before the next event is
/// considered, so ticks missed during a slow read are skipped rather than
/// replayed and the effective sampling rate can drop below the configured one.
pub struct Coordinator<S> {
    source: Arc<S>,
    period: Duration,
    verbose: bool,
    state: CoordinatorState,
}

impl<S: SampleSource> Coordinator<S> {
    pub fn new(source: S, period: Duration, verbose: bool) -> Self {
        Self {
            source: Arc::new(source),
            period: period.clamp(MIN_PERIOD, MAX_PERIOD),
            verbose,
            state: CoordinatorState::Idle,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Samples `pid` until `exited` fires, `cancel` is cancelled or the source fails.
    ///
    /// A dropped `exited` sender counts as child termination. The first sample
    /// is taken one period after the call.
    pub async fn run(
        mut self,
        pid: u32,
        mut exited: oneshot::Receiver<ExitStatus>,
        cancel: CancellationToken,
    ) -> MonitorReport {
        self.transition(CoordinatorState::Running);
        log::log!(
            self.log_level(),
            "Starting memory monitoring of PID {pid} every {:?}",
            self.period
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut series = MemorySeries::default();

        let outcome = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break Outcome::Cancelled,
                status = &mut exited => {
                    break Outcome::Completed {
                        reason: CompletionReason::ChildExited(status.ok()),
                    };
                }
                _ = ticker.tick() => match self.collect(pid).await {
                    Ok(sample) => {
                        series.push(sample);
                        self.log_sample(series.len(), &sample);
                    }
                    Err(err) if err.is_exhausted() => {
                        break Outcome::Completed {
                            reason: CompletionReason::SourceExhausted,
                        };
                    }
                    Err(cause) => break Outcome::Failed { cause },
                },
            }
        };

        self.transition(outcome.state());
        log::log!(
            self.log_level(),
            "Monitoring of PID {pid} {outcome} after {} samples over {:.3}s",
            series.len(),
            series.duration().as_secs_f64()
        );

        MonitorReport { series, outcome }
    }

    async fn collect(&self, pid: u32) -> Result<MemorySample, SourceError> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || source.collect(pid))
            .await
            .unwrap_or_else(|err| {
                Err(SourceError::Aborted {
                    pid,
                    reason: err.to_string(),
                })
            })
    }

    fn transition(&mut self, next: CoordinatorState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid coordinator transition {} -> {}",
            self.state,
            next
        );
        log::trace!("coordinator {} -> {}", self.state, next);
        self.state = next;
    }

    fn log_level(&self) -> log::Level {
        if self.verbose {
            log::Level::Info
        } else {
            log::Level::Debug
        }
    }

    fn log_sample(&self, n: usize, sample: &MemorySample) {
        let level = self.log_level();
        if !log::log_enabled!(level) {
            return;
        }
        let fmt = |metric| {
            sample
                .value(metric)
                .map_or_else(|| "-".to_owned(), |v| v.to_string())
        };
        log::log!(
            level,
            "Sample {n}: RSS={} kB, PSS={} kB, USS={} kB",
            fmt(Metric::Rss),
            fmt(Metric::Pss),
            fmt(Metric::Uss)
        );
    }
}
