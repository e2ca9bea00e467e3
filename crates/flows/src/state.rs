//! Transaction lifecycle states.

/// Where a transaction is in its lifecycle.
///
/// The coordinator drives every execution through this machine:
/// `NotStarted` moves to `Running` when the first step is dispatched,
/// then either straight to `Completed`, or through `Compensating` to
/// `Failed` once a step has failed and the rollback walk begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionState {
    /// No step has run yet.
    #[default]
    NotStarted,

    /// Steps are being executed.
    Running,

    /// A step failed; compensations are running in reverse order.
    Compensating,

    /// Every step completed (terminal).
    Completed,

    /// Compensation finished after a failure (terminal).
    Failed,
}

impl TransactionState {
    /// Returns true if the machine allows moving from `self` to `next`.
    pub fn allows(self, next: TransactionState) -> bool {
        use TransactionState::*;
        matches!(
            (self, next),
            (NotStarted, Running)
                | (Running, Completed)
                | (Running, Compensating)
                | (Compensating, Failed)
        )
    }

    /// Moves to `next`.
    ///
    /// # Panics
    ///
    /// Panics on a transition the machine does not allow.
    pub fn advance(self, next: TransactionState) -> TransactionState {
        assert!(
            self.allows(next),
            "illegal transaction state transition {self} -> {next}"
        );
        next
    }

    /// Returns true once the transaction can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Completed | TransactionState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionState::NotStarted => "NotStarted",
            TransactionState::Running => "Running",
            TransactionState::Compensating => "Compensating",
            TransactionState::Completed => "Completed",
            TransactionState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
