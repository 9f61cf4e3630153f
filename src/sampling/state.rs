use std::fmt;

/// Lifecycle of a [`Coordinator`](super::Coordinator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Constructed, timer not armed yet.
    Idle,
    /// Timer armed, sampling on every tick.
    Running,
    /// Child exited or its memory rollup disappeared.
    Completed,
    /// External cancellation observed.
    Cancelled,
    /// Sample source reported an unreadable rollup.
    Failed,
}

impl CoordinatorState {
    pub(crate) fn can_transition_to(self, next: CoordinatorState) -> bool {
        use CoordinatorState::*;
        matches!(
            (self, next),
            (Idle, Running) | (Running, Completed) | (Running, Cancelled) | (Running, Failed)
        )
    }
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorState::Idle => write!(f, "idle"),
            CoordinatorState::Running => write!(f, "running"),
            CoordinatorState::Completed => write!(f, "completed"),
            CoordinatorState::Cancelled => write!(f, "cancelled"),
            CoordinatorState::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoordinatorState::*;

    #[test]
    fn test_transitions() {
        assert!(Idle.can_transition_to(Running));
        for terminal in [Completed, Cancelled, Failed] {
            assert!(Running.can_transition_to(terminal));
            assert!(!Idle.can_transition_to(terminal));
            for next in [Idle, Running, Completed, Cancelled, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
        assert!(!Running.can_transition_to(Idle));
        assert!(!Running.can_transition_to(Running));
    }
}
