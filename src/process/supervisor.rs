use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::sync::watch;

use super::{Error, ProcessHandle, ProcessState, Result};

/// Time between SIGTERM and SIGKILL when stopping the child's process group.
pub const STOP_GRACE_PERIOD: Duration = Duration::from_millis(500);

const DEFAULT_SHELL: &str = "/bin/sh";

/// Lifecycle control of the monitored child process.
pub trait Supervisor: Send + Sync {
    /// Starts the child.
    ///
    /// # Errors
    ///
    /// Returns an error if the child cannot be spawned or was already started.
    fn start(&self) -> Result<ProcessHandle>;

    /// Suspends until the child exits and returns its exit status.
    ///
    /// Safe to call concurrently with [`Supervisor::stop`].
    fn wait(&self) -> impl Future<Output = Result<ExitStatus>> + Send;

    /// Terminates the child and everything in its process group.
    ///
    /// Idempotent, and a no-op if the child was never started.
    fn stop(&self) -> impl Future<Output = ()> + Send;
}

/// Runs a command line through `/bin/sh -c` in its own process group.
///
/// The child inherits stdout and stderr. A reaper task owns the child and is
/// the only one waiting on it; everybody else observes the published
/// [`ProcessState`], so waiting and stopping never race on the reap.
#[derive(Debug)]
pub struct ShellSupervisor {
    command: String,
    shell: PathBuf,
    verbose: bool,
    handle: OnceLock<ProcessHandle>,
    stop_requested: Arc<AtomicBool>,
}

impl ShellSupervisor {
    pub fn new(command: impl Into<String>, verbose: bool) -> Self {
        Self {
            command: command.into(),
            shell: PathBuf::from(DEFAULT_SHELL),
            verbose,
            handle: OnceLock::new(),
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Uses `shell` instead of `/bin/sh` to run the command line.
    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Handle of the started child, if any.
    pub fn handle(&self) -> Option<&ProcessHandle> {
        self.handle.get()
    }

    fn log_level(&self) -> log::Level {
        if self.verbose {
            log::Level::Info
        } else {
            log::Level::Debug
        }
    }
}

impl Supervisor for ShellSupervisor {
    fn start(&self) -> Result<ProcessHandle> {
        if let Some(handle) = self.handle.get() {
            return Err(Error::AlreadyStarted { pid: handle.pid() });
        }

        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(&self.command)
            .process_group(0)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| Error::Spawn {
                shell: self.shell.clone(),
                command: self.command.clone(),
                source,
            })?;
        let pid = child.id().ok_or_else(|| Error::MissingPid {
            command: self.command.clone(),
        })?;

        let (state_tx, state_rx) = watch::channel(ProcessState::Running);
        let handle = ProcessHandle::new(pid, state_rx);
        if let Err(duplicate) = self.handle.set(handle.clone()) {
            log::warn!("child process {pid} started twice, killing duplicate");
            let _ = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL);
            tokio::spawn(reap(child, pid, state_tx, Arc::new(AtomicBool::new(true))));
            let winner = self.handle.get().unwrap_or(&duplicate);
            return Err(Error::AlreadyStarted { pid: winner.pid() });
        }
        tokio::spawn(reap(
            child,
            pid,
            state_tx,
            Arc::clone(&self.stop_requested),
        ));

        log::log!(self.log_level(), "Started process with PID: {pid}");
        Ok(handle)
    }

    async fn wait(&self) -> Result<ExitStatus> {
        let handle = self.handle.get().ok_or(Error::NotStarted)?;
        handle.wait_for_exit().await
    }

    async fn stop(&self) {
        let Some(handle) = self.handle.get() else {
            log::debug!("no child process started, nothing to stop");
            return;
        };
        if self.stop_requested.swap(true, Ordering::SeqCst) {
            return;
        }

        let pid = handle.pid();
        let group = Pid::from_raw(pid as i32);
        log::log!(self.log_level(), "Terminating process group: {pid}");

        match killpg(group, Signal::SIGTERM) {
            Ok(()) => tokio::time::sleep(STOP_GRACE_PERIOD).await,
            Err(Errno::ESRCH) => log::debug!("process group {pid} already gone"),
            Err(err) => log::warn!("failed to send SIGTERM to process group {pid}: {err}"),
        }
        match killpg(group, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(err) => log::warn!("failed to send SIGKILL to process group {pid}: {err}"),
        }

        match handle.wait_for_exit().await {
            Ok(status) => log::debug!("process {pid} reaped: {status}"),
            Err(err) => log::warn!("{err}"),
        }
    }
}

impl Drop for ShellSupervisor {
    fn drop(&mut self) {
        let Some(handle) = self.handle.get() else {
            return;
        };
        if !self.stop_requested.load(Ordering::SeqCst) && handle.state().is_alive() {
            log::warn!(
                "supervisor dropped without stop, killing process group {}",
                handle.pid()
            );
            let _ = killpg(Pid::from_raw(handle.pid() as i32), Signal::SIGKILL);
        }
    }
}

async fn reap(
    mut child: Child,
    pid: u32,
    state_tx: watch::Sender<ProcessState>,
    stop_requested: Arc<AtomicBool>,
) {
    match child.wait().await {
        Ok(status) => {
            let state = if stop_requested.load(Ordering::SeqCst) {
                ProcessState::Killed(status)
            } else {
                ProcessState::Exited(status)
            };
            log::debug!("process {pid} {state}");
            state_tx.send_replace(state);
        }
        Err(err) => log::error!("failed to wait for process {pid}: {err}"),
    }
}
