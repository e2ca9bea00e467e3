//! Flow error types.

use backend::BackendError;
use domain::DraftError;
use thiserror::Error;

/// An error raised by a step's `run` or `compensate` operation.
#[derive(Debug, Error)]
pub enum StepError {
    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The step needed a value an earlier step should have produced.
    #[error("missing {0} in flow context")]
    MissingContext(&'static str),
}

/// A step failed, terminating its transaction.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("step '{step}' failed: {reason}")]
pub struct StepFailure {
    /// Name of the step that failed.
    pub step: &'static str,
    /// What the backend reported.
    pub reason: String,
}

/// A compensation operation failed. Logged and surfaced as a secondary
/// warning; the original step failure is what callers see.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("compensation for step '{step}' failed: {reason}")]
pub struct CompensationFailure {
    /// Name of the step whose compensation failed.
    pub step: &'static str,
    /// What the backend reported.
    pub reason: String,
}

/// The single error a creation flow surfaces to its caller.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The draft failed pre-flight validation; nothing was written.
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// A write step failed; prior steps were compensated in reverse
    /// order. `compensation_failures` lists rollbacks that themselves
    /// failed and may have left orphan rows behind.
    #[error("{failure}")]
    Step {
        failure: StepFailure,
        compensation_failures: Vec<CompensationFailure>,
    },

    /// A pre-flight read (reference list fetch) failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A stored row could not be parsed into its typed record.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transaction reported success but an expected context value was
    /// absent. Indicates a mis-wired step list.
    #[error("flow context missing {0} after execution")]
    MissingResult(&'static str),
}

/// Convenience type alias for flow results.
pub type Result<T> = std::result::Result<T, FlowError>;
