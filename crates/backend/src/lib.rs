//! Backend capability traits and implementations.
//!
//! The remote backend offers relational storage, object storage, and a
//! realtime change feed. This crate models those capabilities as narrow
//! traits so the rest of the workspace never touches a concrete client:
//! - [`DataStore`] for row-level insert/update/delete/fetch
//! - [`ObjectStore`] for binary uploads with no-overwrite semantics
//! - [`ChangeFeed`] for per-table push notifications
//!
//! [`InMemoryBackend`] implements all three and adds fault injection for
//! tests. [`PostgresBackend`] implements [`DataStore`] over a single
//! jsonb-backed table.

pub mod data;
pub mod error;
pub mod feed;
pub mod memory;
pub mod objects;
pub mod postgres;
pub mod record;

pub use common::RecordId;
pub use data::DataStore;
pub use error::{BackendError, Result};
pub use feed::{ChangeFeed, ChangeStream};
pub use memory::InMemoryBackend;
pub use objects::ObjectStore;
pub use postgres::PostgresBackend;
pub use record::{ChangeEvent, ChangeKind, StoredRecord};
