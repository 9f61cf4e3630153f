use std::fmt;
use std::process::ExitStatus;

use chrono::{DateTime, Local};
use tokio::sync::watch;

use super::{Error, Result};

/// Liveness of a supervised child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Child process is alive.
    Running,
    /// Exited on its own, normally or through a signal.
    Exited(ExitStatus),
    /// Terminated by the supervisor.
    Killed(ExitStatus),
}

impl ProcessState {
    pub fn is_alive(self) -> bool {
        self == ProcessState::Running
    }

    pub fn exit_status(self) -> Option<ExitStatus> {
        match self {
            ProcessState::Running => None,
            ProcessState::Exited(status) | ProcessState::Killed(status) => Some(status),
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Running => write!(f, "running"),
            ProcessState::Exited(status) => write!(f, "exited ({status})"),
            ProcessState::Killed(status) => write!(f, "killed ({status})"),
        }
    }
}

/// Identity and liveness of a started child.
///
/// The pid and start time never change after start. The state is published by
/// the supervisor's reaper and can be observed from any number of clones.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: u32,
    start_time: DateTime<Local>,
    state: watch::Receiver<ProcessState>,
}

impl ProcessHandle {
    pub(crate) fn new(pid: u32, state: watch::Receiver<ProcessState>) -> Self {
        Self {
            pid,
            start_time: Local::now(),
            state,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Wall clock time the child was started.
    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub fn state(&self) -> ProcessState {
        *self.state.borrow()
    }

    /// Suspends until the child has been reaped and returns its exit status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReaperGone`] if the reaper stopped without observing the exit.
    pub async fn wait_for_exit(&self) -> Result<ExitStatus> {
        let mut state = self.state.clone();
        let state = state
            .wait_for(|s| !s.is_alive())
            .await
            .map_err(|_| Error::ReaperGone { pid: self.pid })?;
        state.exit_status().ok_or(Error::ReaperGone { pid: self.pid })
    }
}
