//! Compensating transaction coordinator and the entity creation flows.
//!
//! The remote backend offers no multi-statement transactions, so a
//! multi-row creation (parent row, dependent rows, optional file upload,
//! asset-reference patch) is approximated as an ordered [`Transaction`]
//! of [`Step`]s: steps run strictly sequentially, and when one fails the
//! already-succeeded steps are compensated in reverse order. Compensation
//! is best effort; a failed compensation is reported as a warning, never
//! raised.
//!
//! The four creation flows (team, service, store, product) validate their
//! drafts fully before the first write, then wire the generic steps from
//! [`steps`] into a transaction.

pub mod context;
pub mod coordinator;
pub mod error;
pub mod product;
pub mod service;
pub mod state;
pub mod steps;
pub mod store;
pub mod team;
pub mod trace;

pub use context::FlowContext;
pub use coordinator::{Step, Transaction, TransactionReport};
pub use error::{CompensationFailure, FlowError, StepError, StepFailure};
pub use product::ProductFlow;
pub use service::ServiceFlow;
pub use state::TransactionState;
pub use steps::{InsertDependents, InsertParent, PatchAssetRef, UploadAsset};
pub use store::StoreFlow;
pub use team::TeamFlow;
pub use trace::{TraceEntry, TransactionTrace};
