//! The sampling coordinator.
//!
//! A [`Coordinator`] owns the sampling timer and merges it with the child's
//! termination notification and an external [`CancellationToken`] into a
//! single event loop. It is the only writer of the [`MemorySeries`] and hands
//! the series over in a [`MonitorReport`] once a terminal state is reached.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken
//! [`MemorySeries`]: crate::series::MemorySeries
mod coordinator;
mod outcome;
mod state;

pub use coordinator::{Coordinator, MAX_PERIOD, MIN_PERIOD, period_for};
pub use outcome::{CompletionReason, MonitorReport, Outcome};
pub use state::CoordinatorState;
