use std::fmt;
use std::process::ExitStatus;

use super::CoordinatorState;
use crate::rollup::SourceError;
use crate::series::MemorySeries;

/// Why monitoring completed normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The supervisor reported the child's exit. `None` if the exit status was lost.
    ChildExited(Option<ExitStatus>),
    /// The child's memory rollup vanished before its exit was reported.
    SourceExhausted,
}

/// How a monitoring run ended.
#[derive(Debug)]
pub enum Outcome {
    Completed { reason: CompletionReason },
    Cancelled,
    Failed { cause: SourceError },
}

impl Outcome {
    /// Terminal coordinator state matching this outcome.
    pub fn state(&self) -> CoordinatorState {
        match self {
            Outcome::Completed { .. } => CoordinatorState::Completed,
            Outcome::Cancelled => CoordinatorState::Cancelled,
            Outcome::Failed { .. } => CoordinatorState::Failed,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Completed {
                reason: CompletionReason::ChildExited(Some(status)),
            } => write!(f, "completed, child {status}"),
            Outcome::Completed {
                reason: CompletionReason::ChildExited(None),
            } => write!(f, "completed, child exited"),
            Outcome::Completed {
                reason: CompletionReason::SourceExhausted,
            } => write!(f, "completed, memory rollup vanished"),
            Outcome::Cancelled => write!(f, "cancelled"),
            Outcome::Failed { cause } => write!(f, "failed: {cause}"),
        }
    }
}

/// Samples collected during one run together with the reason the run ended.
///
/// The series is complete and no longer mutated once a report exists, whatever
/// the outcome.
#[derive(Debug)]
pub struct MonitorReport {
    pub series: MemorySeries,
    pub outcome: Outcome,
}

impl MonitorReport {
    pub fn state(&self) -> CoordinatorState {
        self.outcome.state()
    }
}
