//! Execution trace for compensating transactions.
//!
//! The trace is an in-memory journal of step lifecycle entries. It backs
//! structured logging and lets tests assert execution and rollback order
//! without poking at backend internals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry in a transaction's execution trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TraceEntry {
    /// Transaction execution started.
    TransactionStarted {
        transaction: String,
        started_at: DateTime<Utc>,
    },

    /// A step started execution.
    StepStarted { step: String },

    /// A step completed successfully.
    StepCompleted { step: String },

    /// A step failed, terminating forward execution.
    StepFailed { step: String, error: String },

    /// Compensation started after a step failure.
    CompensationStarted { from_step: String },

    /// A compensation operation completed successfully.
    CompensationStepCompleted { step: String },

    /// A compensation operation failed (logged, compensation continues).
    CompensationStepFailed { step: String, error: String },

    /// All steps completed successfully.
    TransactionCompleted { completed_at: DateTime<Utc> },

    /// The transaction failed after compensation.
    TransactionFailed {
        reason: String,
        failed_at: DateTime<Utc>,
    },
}

impl TraceEntry {
    /// Returns the entry kind as a string.
    pub fn kind(&self) -> &'static str {
        match self {
            TraceEntry::TransactionStarted { .. } => "TransactionStarted",
            TraceEntry::StepStarted { .. } => "StepStarted",
            TraceEntry::StepCompleted { .. } => "StepCompleted",
            TraceEntry::StepFailed { .. } => "StepFailed",
            TraceEntry::CompensationStarted { .. } => "CompensationStarted",
            TraceEntry::CompensationStepCompleted { .. } => "CompensationStepCompleted",
            TraceEntry::CompensationStepFailed { .. } => "CompensationStepFailed",
            TraceEntry::TransactionCompleted { .. } => "TransactionCompleted",
            TraceEntry::TransactionFailed { .. } => "TransactionFailed",
        }
    }
}

/// The ordered journal of one transaction execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionTrace {
    entries: Vec<TraceEntry>,
}

impl TransactionTrace {
    /// Creates a trace opened with a `TransactionStarted` entry.
    pub fn started(transaction: impl Into<String>) -> Self {
        let mut trace = Self::default();
        trace.push(TraceEntry::TransactionStarted {
            transaction: transaction.into(),
            started_at: Utc::now(),
        });
        trace
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    /// All entries in execution order.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of steps that recorded a `StepCompleted` entry, in order.
    pub fn completed_steps(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                TraceEntry::StepCompleted { step } => Some(step.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names of steps that recorded a `CompensationStepCompleted` entry,
    /// in compensation order.
    pub fn compensated_steps(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                TraceEntry::CompensationStepCompleted { step } => Some(step.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn started_trace_opens_with_transaction_started() {
        let trace = TransactionTrace::started("create_team");
        assert_eq!(trace.entries().len(), 1);
        assert_eq!(trace.entries()[0].kind(), "TransactionStarted");
    }

    #[test]
    fn completed_and_compensated_step_queries() {
        let mut trace = TransactionTrace::started("create_team");
        trace.push(TraceEntry::StepStarted {
            step: "insert_team".to_string(),
        });
        trace.push(TraceEntry::StepCompleted {
            step: "insert_team".to_string(),
        });
        trace.push(TraceEntry::StepStarted {
            step: "insert_members".to_string(),
        });
        trace.push(TraceEntry::StepFailed {
            step: "insert_members".to_string(),
            error: "service unavailable".to_string(),
        });
        trace.push(TraceEntry::CompensationStarted {
            from_step: "insert_members".to_string(),
        });
        trace.push(TraceEntry::CompensationStepCompleted {
            step: "insert_team".to_string(),
        });

        assert_eq!(trace.completed_steps(), vec!["insert_team"]);
        assert_eq!(trace.compensated_steps(), vec!["insert_team"]);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut trace = TransactionTrace::started("create_store");
        trace.push(TraceEntry::StepCompleted {
            step: "insert_store".to_string(),
        });

        let json = serde_json::to_string(&trace).unwrap();
        let deserialized: TransactionTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.entries().len(), 2);
        assert_eq!(deserialized.completed_steps(), vec!["insert_store"]);
    }
}
