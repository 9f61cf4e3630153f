//! Memrollup Stats: samples the memory footprint of a child process through
//! `/proc/<pid>/smaps_rollup` and reports per-metric statistics.
//!
//! The child is started through `/bin/sh -c` in its own process group. A
//! sampling coordinator reads the rollup at a fixed frequency until the child
//! exits, monitoring is cancelled (SIGINT/SIGTERM) or the rollup can no longer
//! be read. The collected series is summarized as min, max, mean and
//! population standard deviation of RSS, PSS, USS and the shared/private
//! clean/dirty counters, and written as CSV or JSON.
pub mod config;
pub mod environment;
pub mod error;
pub mod fsutil;
pub mod process;
pub mod report;
pub mod rollup;
pub mod sampling;
pub mod series;

use std::sync::Arc;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use config::RunConfiguration;
use error::{Error, ResultOkLogExt};
use process::{ProcessHandle, ShellSupervisor, Supervisor};
use report::{Destination, Report};
use rollup::{ProcRollupSource, SampleSource};
use sampling::{Coordinator, MonitorReport, Outcome};

pub use error::Result;

/// Mount point of procfs.
pub const PROC_ROOT: &str = "/proc";

/// Runs one monitoring session as configured.
///
/// Validates the environment, starts the command, samples it until it ends
/// and writes the report. A partial series is reported even when monitoring
/// is cancelled or the rollup becomes unreadable.
///
/// # Errors
///
/// Returns an error if the environment is unsuitable, the command cannot be
/// started, the rollup becomes unreadable, or the report cannot be written.
pub async fn run(config: &RunConfiguration) -> Result<()> {
    if config.is_high_frequency() {
        log::warn!(
            "High frequency ({:.1} Hz) may impact system performance",
            config.frequency
        );
    }
    environment::validate_environment(PROC_ROOT, config.output.as_deref())?;

    let cancel = CancellationToken::new();
    let signals = listen_for_shutdown_signals(cancel.clone())?;

    let supervisor = Arc::new(ShellSupervisor::new(&config.command, config.verbose));
    let source = ProcRollupSource::new(PROC_ROOT);
    let result = supervise(supervisor, source, config, cancel).await;
    signals.abort();
    let (handle, MonitorReport { series, outcome }) = result?;

    let failure = match outcome {
        Outcome::Completed { reason } => {
            log::debug!("Monitoring completed: {reason:?}");
            None
        }
        Outcome::Cancelled => {
            log::warn!("Monitoring cancelled, reporting {} samples", series.len());
            None
        }
        Outcome::Failed { cause } => {
            log::error!("Memory monitoring error: {cause}");
            Some(cause)
        }
    };

    let report = (!series.is_empty()).then(|| {
        Report::new(
            config.command.as_str(),
            handle.pid(),
            config.frequency,
            handle.start_time(),
            &series,
        )
    });
    let formatter = report::formatter_for(config.json);
    report::write_results(
        report.as_ref(),
        formatter.as_ref(),
        &Destination::from_output(config.output.as_deref()),
    )?;

    match failure {
        Some(cause) => Err(Error::Monitoring(cause)),
        None => Ok(()),
    }
}

/// Starts the child, samples it with `source` and stops it.
///
/// `stop()` is called exactly once after monitoring ended, whatever the
/// outcome. The child's exit is forwarded to the coordinator by a separate
/// waiter task.
///
/// # Errors
///
/// Returns [`Error::Start`] if the child cannot be started. Nothing is
/// monitored in that case.
pub async fn supervise<P, S>(
    supervisor: Arc<P>,
    source: S,
    config: &RunConfiguration,
    cancel: CancellationToken,
) -> Result<(ProcessHandle, MonitorReport)>
where
    P: Supervisor + 'static,
    S: SampleSource,
{
    let handle = supervisor.start().map_err(Error::Start)?;

    let (exit_tx, exit_rx) = oneshot::channel();
    let waiter = {
        let supervisor = Arc::clone(&supervisor);
        tokio::spawn(async move {
            if let Some(status) = supervisor.wait().await.ok_log() {
                let _ = exit_tx.send(status);
            }
        })
    };

    let coordinator = Coordinator::new(source, config.period(), config.verbose);
    let report = coordinator.run(handle.pid(), exit_rx, cancel).await;

    supervisor.stop().await;
    if let Err(err) = waiter.await {
        log::warn!("child waiter task failed: {err}");
    }

    Ok((handle, report))
}

/// Cancels `cancel` on the first SIGINT or SIGTERM.
///
/// The handlers are installed before returning, so a signal received later is
/// never lost to the default disposition.
fn listen_for_shutdown_signals(cancel: CancellationToken) -> Result<JoinHandle<()>> {
    let mut sigterm = signal(SignalKind::terminate()).map_err(Error::Signal)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(Error::Signal)?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => log::info!("received SIGTERM"),
            _ = sigint.recv() => log::info!("received SIGINT"),
            () = cancel.cancelled() => return,
        }
        cancel.cancel();
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::watch;

    use crate::process::ProcessState;
    use crate::rollup::{RollupStat, SourceError};
    use crate::sampling::{CompletionReason, CoordinatorState};
    use crate::series::MemorySample;

    const CHILD_PID: u32 = 4242;
    const TEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Publishes a fake child's state and counts `stop()` calls.
    struct CountingSupervisor {
        exit_after: Option<Duration>,
        state: Arc<watch::Sender<ProcessState>>,
        stop_calls: AtomicUsize,
    }

    impl CountingSupervisor {
        fn new(exit_after: Option<Duration>) -> Self {
            let (state, _) = watch::channel(ProcessState::Running);
            Self {
                exit_after,
                state: Arc::new(state),
                stop_calls: AtomicUsize::new(0),
            }
        }

        fn stop_calls(&self) -> usize {
            self.stop_calls.load(Ordering::SeqCst)
        }
    }

    impl Supervisor for CountingSupervisor {
        fn start(&self) -> process::Result<ProcessHandle> {
            if let Some(delay) = self.exit_after {
                let state = Arc::clone(&self.state);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    state.send_replace(ProcessState::Exited(ExitStatus::from_raw(0)));
                });
            }
            Ok(ProcessHandle::new(CHILD_PID, self.state.subscribe()))
        }

        async fn wait(&self) -> process::Result<ExitStatus> {
            ProcessHandle::new(CHILD_PID, self.state.subscribe())
                .wait_for_exit()
                .await
        }

        async fn stop(&self) {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            self.state.send_if_modified(|state| {
                if !state.is_alive() {
                    return false;
                }
                *state = ProcessState::Killed(ExitStatus::from_raw(9));
                true
            });
        }
    }

    struct ScriptedSource<F> {
        calls: AtomicUsize,
        on_call: F,
    }

    impl<F> SampleSource for ScriptedSource<F>
    where
        F: Fn(usize) -> std::result::Result<(), SourceError> + Send + Sync + 'static,
    {
        fn collect(&self, _pid: u32) -> std::result::Result<MemorySample, SourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            (self.on_call)(n)?;
            let stat = RollupStat {
                rss: Some(n as u64 * 100),
                ..RollupStat::default()
            };
            Ok(MemorySample::new(std::time::Instant::now(), stat))
        }
    }

    fn source<F>(on_call: F) -> ScriptedSource<F>
    where
        F: Fn(usize) -> std::result::Result<(), SourceError> + Send + Sync + 'static,
    {
        ScriptedSource {
            calls: AtomicUsize::new(0),
            on_call,
        }
    }

    fn config() -> RunConfiguration {
        RunConfiguration {
            frequency: 100.0,
            command: "fake".to_owned(),
            verbose: false,
            output: None,
            json: false,
        }
    }

    async fn supervise_with<S: SampleSource>(
        supervisor: &Arc<CountingSupervisor>,
        source: S,
        cancel: CancellationToken,
    ) -> (ProcessHandle, MonitorReport) {
        tokio::time::timeout(
            TEST_TIMEOUT,
            supervise(Arc::clone(supervisor), source, &config(), cancel),
        )
        .await
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn test_supervise_stops_once_after_child_exit() {
        let supervisor = Arc::new(CountingSupervisor::new(Some(Duration::from_millis(50))));

        let (handle, report) =
            supervise_with(&supervisor, source(|_| Ok(())), CancellationToken::new()).await;

        assert!(matches!(
            report.outcome,
            Outcome::Completed {
                reason: CompletionReason::ChildExited(Some(_))
            }
        ));
        assert_eq!(handle.pid(), CHILD_PID);
        assert!(matches!(handle.state(), ProcessState::Exited(_)));
        assert_eq!(supervisor.stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_supervise_stops_once_after_cancellation() {
        let supervisor = Arc::new(CountingSupervisor::new(None));
        let cancel = CancellationToken::new();
        let scripted = {
            let cancel = cancel.clone();
            source(move |n| {
                if n == 2 {
                    cancel.cancel();
                }
                Ok(())
            })
        };

        let (handle, report) = supervise_with(&supervisor, scripted, cancel).await;

        assert!(matches!(report.outcome, Outcome::Cancelled));
        assert_eq!(report.series.len(), 2);
        assert!(matches!(handle.state(), ProcessState::Killed(_)));
        assert_eq!(supervisor.stop_calls(), 1);
    }

    #[tokio::test]
    async fn test_supervise_stops_once_after_source_failure() {
        let supervisor = Arc::new(CountingSupervisor::new(None));
        let scripted = source(|n| {
            if n == 3 {
                return Err(SourceError::Unreadable {
                    path: "/proc/4242/smaps_rollup".into(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            Ok(())
        });

        let (handle, report) =
            supervise_with(&supervisor, scripted, CancellationToken::new()).await;

        assert_eq!(report.state(), CoordinatorState::Failed);
        assert_eq!(report.series.len(), 2);
        assert!(matches!(handle.state(), ProcessState::Killed(_)));
        assert_eq!(supervisor.stop_calls(), 1);
    }
}
