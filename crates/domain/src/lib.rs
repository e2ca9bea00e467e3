//! Domain layer: entity drafts, stored records, and pre-flight validation.
//!
//! A *draft* is the raw form input for a creation flow; a *record* is the
//! typed view of a row after the backend stored it. Every draft validates
//! itself fully before the first write is issued, so validation failures
//! never need compensation.

pub mod file;
pub mod product;
pub mod service;
pub mod store;
pub mod tables;
pub mod team;
pub mod validation;

pub use file::{FileConstraintError, FileUpload, MAX_UPLOAD_BYTES};
pub use product::{Identifier, ProductDraft, ProductRecord};
pub use service::{ClientDraft, ServiceDraft, ServiceRecord};
pub use store::{AddressDraft, ContactDraft, StoreDraft, StoreRecord};
pub use team::{TeamDraft, TeamRecord};
pub use validation::{DraftError, ReferenceError, ValidationError};
