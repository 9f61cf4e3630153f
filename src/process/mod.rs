//! Supervision of the monitored child process.
//!
//! The child runs through `/bin/sh -c` in its own process group so that
//! stopping it also takes down any pipeline or background job it spawned.
mod error;
mod state;
mod supervisor;

pub use error::{Error, Result};
pub use state::{ProcessHandle, ProcessState};
pub use supervisor::{STOP_GRACE_PERIOD, ShellSupervisor, Supervisor};
