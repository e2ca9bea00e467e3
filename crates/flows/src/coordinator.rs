//! The compensating transaction coordinator.
//!
//! Executes an ordered list of steps against the remote backend such
//! that the net visible effect is all-or-nothing, approximated via
//! manual compensation: when a step fails, the already-succeeded steps
//! are undone in reverse order.

use async_trait::async_trait;

use crate::error::{CompensationFailure, FlowError, StepError, StepFailure};
use crate::state::TransactionState;
use crate::trace::{TraceEntry, TransactionTrace};

/// One unit of work in a transaction.
///
/// `run` performs the forward operation and merges its outputs into the
/// shared context for later steps. `compensate` undoes it; the default
/// is a no-op for steps whose effect is covered by an earlier step's
/// compensation. Compensation must tolerate partial application of its
/// own step (e.g. a batch insert that half-applied).
#[async_trait]
pub trait Step<C: Send>: Send + Sync {
    /// Name of the step, used in errors, traces, and logs.
    fn name(&self) -> &'static str;

    /// Performs the step.
    async fn run(&self, ctx: &mut C) -> Result<(), StepError>;

    /// Undoes the step after a later step failed.
    async fn compensate(&self, _ctx: &mut C) -> Result<(), StepError> {
        Ok(())
    }
}

/// An ordered list of steps executed with compensation on failure.
pub struct Transaction<C: Send> {
    name: &'static str,
    steps: Vec<Box<dyn Step<C>>>,
}

impl<C: Send> Transaction<C> {
    /// Creates an empty transaction.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    pub fn step(mut self, step: impl Step<C> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the transaction has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Executes the steps strictly sequentially.
    ///
    /// On the first failure, forward execution stops and every step that
    /// already succeeded is compensated in reverse order. Compensation
    /// failures are logged and recorded in the report but never raised;
    /// the backend may be left with orphan rows in that case, which the
    /// report makes visible rather than hiding.
    #[tracing::instrument(skip(self, ctx), fields(transaction = self.name))]
    pub async fn execute(self, ctx: &mut C) -> TransactionReport {
        metrics::counter!("transaction_executions_total").increment(1);
        let started = std::time::Instant::now();

        let mut trace = TransactionTrace::started(self.name);
        let mut state = TransactionState::default().advance(TransactionState::Running);
        let mut completed: Vec<usize> = Vec::new();
        let mut failure: Option<StepFailure> = None;

        for (index, step) in self.steps.iter().enumerate() {
            tracing::info!(step = step.name(), "transaction step started");
            trace.push(TraceEntry::StepStarted {
                step: step.name().to_string(),
            });

            match step.run(ctx).await {
                Ok(()) => {
                    trace.push(TraceEntry::StepCompleted {
                        step: step.name().to_string(),
                    });
                    completed.push(index);
                }
                Err(e) => {
                    let reason = e.to_string();
                    tracing::warn!(step = step.name(), error = %reason, "transaction step failed");
                    trace.push(TraceEntry::StepFailed {
                        step: step.name().to_string(),
                        error: reason.clone(),
                    });
                    failure = Some(StepFailure {
                        step: step.name(),
                        reason,
                    });
                    break;
                }
            }
        }

        let mut compensation_failures: Vec<CompensationFailure> = Vec::new();

        match &failure {
            None => {
                state = state.advance(TransactionState::Completed);
                trace.push(TraceEntry::TransactionCompleted {
                    completed_at: chrono::Utc::now(),
                });
                metrics::counter!("transactions_completed").increment(1);
                tracing::info!(transaction = self.name, state = %state, "transaction completed");
            }
            Some(step_failure) => {
                state = state.advance(TransactionState::Compensating);
                trace.push(TraceEntry::CompensationStarted {
                    from_step: step_failure.step.to_string(),
                });

                // Undo succeeded steps in reverse order.
                for index in completed.iter().rev() {
                    let step = &self.steps[*index];
                    match step.compensate(ctx).await {
                        Ok(()) => {
                            trace.push(TraceEntry::CompensationStepCompleted {
                                step: step.name().to_string(),
                            });
                        }
                        Err(e) => {
                            let reason = e.to_string();
                            tracing::warn!(
                                step = step.name(),
                                error = %reason,
                                "compensation step failed, continuing"
                            );
                            trace.push(TraceEntry::CompensationStepFailed {
                                step: step.name().to_string(),
                                error: reason.clone(),
                            });
                            compensation_failures.push(CompensationFailure {
                                step: step.name(),
                                reason,
                            });
                            metrics::counter!("transaction_compensation_failures").increment(1);
                        }
                    }
                }

                state = state.advance(TransactionState::Failed);
                trace.push(TraceEntry::TransactionFailed {
                    reason: step_failure.to_string(),
                    failed_at: chrono::Utc::now(),
                });
                metrics::counter!("transactions_failed").increment(1);
                tracing::warn!(
                    transaction = self.name,
                    failed_step = step_failure.step,
                    state = %state,
                    "transaction failed and was compensated"
                );
            }
        }

        debug_assert!(state.is_terminal());
        metrics::histogram!("transaction_duration_seconds").record(started.elapsed().as_secs_f64());

        TransactionReport {
            state,
            compensation_failures,
            failure,
            trace,
        }
    }
}

/// The outcome of one transaction execution.
#[derive(Debug)]
pub struct TransactionReport {
    state: TransactionState,
    compensation_failures: Vec<CompensationFailure>,
    failure: Option<StepFailure>,
    trace: TransactionTrace,
}

impl TransactionReport {
    /// Terminal state (`Completed` or `Failed`).
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true if every step completed.
    pub fn is_success(&self) -> bool {
        self.state == TransactionState::Completed
    }

    /// Steps that ran to completion, in execution order.
    pub fn completed_steps(&self) -> Vec<&str> {
        self.trace.completed_steps()
    }

    /// Steps whose compensation ran successfully, in compensation order.
    pub fn compensated_steps(&self) -> Vec<&str> {
        self.trace.compensated_steps()
    }

    /// Compensations that themselves failed.
    pub fn compensation_failures(&self) -> &[CompensationFailure] {
        &self.compensation_failures
    }

    /// The step failure that terminated the transaction, if any.
    pub fn failure(&self) -> Option<&StepFailure> {
        self.failure.as_ref()
    }

    /// The full execution trace.
    pub fn trace(&self) -> &TransactionTrace {
        &self.trace
    }

    /// Converts a failed report into the flow-level error, or None if the
    /// transaction succeeded.
    pub fn into_error(self) -> Option<FlowError> {
        self.failure.map(|failure| FlowError::Step {
            failure,
            compensation_failures: self.compensation_failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Journal {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Journal {
        fn log(&self, entry: impl Into<String>) {
            self.calls.lock().unwrap().push(entry.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct ScriptedStep {
        name: &'static str,
        fail_run: bool,
        fail_compensate: bool,
        journal: Arc<Journal>,
    }

    impl ScriptedStep {
        fn ok(name: &'static str, journal: Arc<Journal>) -> Self {
            Self {
                name,
                fail_run: false,
                fail_compensate: false,
                journal,
            }
        }

        fn failing(name: &'static str, journal: Arc<Journal>) -> Self {
            Self {
                name,
                fail_run: true,
                fail_compensate: false,
                journal,
            }
        }

        fn with_broken_compensation(mut self) -> Self {
            self.fail_compensate = true;
            self
        }
    }

    #[async_trait]
    impl Step<Vec<String>> for ScriptedStep {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, ctx: &mut Vec<String>) -> Result<(), StepError> {
            self.journal.log(format!("run:{}", self.name));
            if self.fail_run {
                return Err(StepError::MissingContext("scripted failure"));
            }
            ctx.push(self.name.to_string());
            Ok(())
        }

        async fn compensate(&self, ctx: &mut Vec<String>) -> Result<(), StepError> {
            self.journal.log(format!("undo:{}", self.name));
            if self.fail_compensate {
                return Err(StepError::MissingContext("scripted compensation failure"));
            }
            ctx.retain(|s| s != self.name);
            Ok(())
        }
    }

    #[tokio::test]
    async fn all_steps_complete_in_order() {
        let journal = Arc::new(Journal::default());
        let txn = Transaction::new("test")
            .step(ScriptedStep::ok("one", journal.clone()))
            .step(ScriptedStep::ok("two", journal.clone()))
            .step(ScriptedStep::ok("three", journal.clone()));

        let mut ctx = Vec::new();
        let report = txn.execute(&mut ctx).await;

        assert!(report.is_success());
        assert_eq!(report.state(), TransactionState::Completed);
        assert_eq!(report.completed_steps(), &["one", "two", "three"]);
        assert!(report.compensated_steps().is_empty());
        assert!(report.failure().is_none());
        assert_eq!(ctx, vec!["one", "two", "three"]);
        assert_eq!(journal.calls(), vec!["run:one", "run:two", "run:three"]);
    }

    #[tokio::test]
    async fn failure_stops_forward_execution() {
        let journal = Arc::new(Journal::default());
        let txn = Transaction::new("test")
            .step(ScriptedStep::ok("one", journal.clone()))
            .step(ScriptedStep::failing("two", journal.clone()))
            .step(ScriptedStep::ok("three", journal.clone()));

        let mut ctx = Vec::new();
        let report = txn.execute(&mut ctx).await;

        assert!(!report.is_success());
        // Step three never ran.
        assert_eq!(
            journal.calls(),
            vec!["run:one", "run:two", "undo:one"],
        );
        assert_eq!(report.failure().unwrap().step, "two");
    }

    #[tokio::test]
    async fn compensation_runs_in_reverse_order() {
        let journal = Arc::new(Journal::default());
        let txn = Transaction::new("test")
            .step(ScriptedStep::ok("one", journal.clone()))
            .step(ScriptedStep::ok("two", journal.clone()))
            .step(ScriptedStep::ok("three", journal.clone()))
            .step(ScriptedStep::failing("four", journal.clone()));

        let mut ctx = Vec::new();
        let report = txn.execute(&mut ctx).await;

        assert_eq!(report.state(), TransactionState::Failed);
        assert_eq!(report.completed_steps(), &["one", "two", "three"]);
        assert_eq!(report.compensated_steps(), &["three", "two", "one"]);
        assert!(ctx.is_empty());
        assert_eq!(
            journal.calls(),
            vec![
                "run:one",
                "run:two",
                "run:three",
                "run:four",
                "undo:three",
                "undo:two",
                "undo:one",
            ],
        );
    }

    #[tokio::test]
    async fn first_step_failure_needs_no_compensation() {
        let journal = Arc::new(Journal::default());
        let txn = Transaction::new("test")
            .step(ScriptedStep::failing("one", journal.clone()))
            .step(ScriptedStep::ok("two", journal.clone()));

        let mut ctx = Vec::new();
        let report = txn.execute(&mut ctx).await;

        assert_eq!(report.state(), TransactionState::Failed);
        assert!(report.completed_steps().is_empty());
        assert!(report.compensated_steps().is_empty());
        assert_eq!(journal.calls(), vec!["run:one"]);
    }

    #[tokio::test]
    async fn compensation_failure_does_not_stop_the_chain() {
        let journal = Arc::new(Journal::default());
        let txn = Transaction::new("test")
            .step(ScriptedStep::ok("one", journal.clone()))
            .step(ScriptedStep::ok("two", journal.clone()).with_broken_compensation())
            .step(ScriptedStep::failing("three", journal.clone()));

        let mut ctx = Vec::new();
        let report = txn.execute(&mut ctx).await;

        assert_eq!(report.state(), TransactionState::Failed);
        // "two"'s compensation failed but "one" was still compensated.
        assert_eq!(report.compensated_steps(), &["one"]);
        assert_eq!(report.compensation_failures().len(), 1);
        assert_eq!(report.compensation_failures()[0].step, "two");
        assert_eq!(
            journal.calls(),
            vec!["run:one", "run:two", "run:three", "undo:two", "undo:one"],
        );
    }

    #[tokio::test]
    async fn into_error_carries_failure_and_warnings() {
        let journal = Arc::new(Journal::default());
        let txn = Transaction::new("test")
            .step(ScriptedStep::ok("one", journal.clone()).with_broken_compensation())
            .step(ScriptedStep::failing("two", journal.clone()));

        let mut ctx = Vec::new();
        let report = txn.execute(&mut ctx).await;
        let error = report.into_error().unwrap();

        match error {
            FlowError::Step {
                failure,
                compensation_failures,
            } => {
                assert_eq!(failure.step, "two");
                assert_eq!(compensation_failures.len(), 1);
                assert_eq!(compensation_failures[0].step, "one");
            }
            other => panic!("expected FlowError::Step, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_report_has_no_error() {
        let journal = Arc::new(Journal::default());
        let txn = Transaction::new("test").step(ScriptedStep::ok("one", journal));

        let mut ctx = Vec::new();
        let report = txn.execute(&mut ctx).await;
        assert!(report.into_error().is_none());
    }

    #[tokio::test]
    async fn trace_records_the_full_lifecycle() {
        let journal = Arc::new(Journal::default());
        let txn = Transaction::new("test")
            .step(ScriptedStep::ok("one", journal.clone()))
            .step(ScriptedStep::failing("two", journal.clone()));

        let mut ctx = Vec::new();
        let report = txn.execute(&mut ctx).await;

        let kinds: Vec<&str> = report.trace().entries().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "TransactionStarted",
                "StepStarted",
                "StepCompleted",
                "StepStarted",
                "StepFailed",
                "CompensationStarted",
                "CompensationStepCompleted",
                "TransactionFailed",
            ],
        );
    }

    #[tokio::test]
    async fn empty_transaction_completes() {
        let txn: Transaction<Vec<String>> = Transaction::new("empty");
        assert!(txn.is_empty());

        let mut ctx = Vec::new();
        let report = txn.execute(&mut ctx).await;
        assert!(report.is_success());
        assert!(report.completed_steps().is_empty());
    }
}
