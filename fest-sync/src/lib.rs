//! # fest-sync
//!
//! Reconciles remote festival listing snapshots into a local store.
//!
//! **Layers, leaf first:**
//! - [`matcher`]: field-by-field equality between a local record and a remote value
//! - [`identity`]: natural-key filters selecting local counterparts
//! - [`reconcile`]: per-kind glue ([`Reconcilable`]) used by the upsert engine
//! - [`upsert`]: insert / update-in-place / no-op for one remote value
//! - [`coordinator`]: dependency-ordered batch import, cancellation sweep, single commit
//! - [`worker`]: one task owning the coordinator, fed through [`SyncHandle`]s
//!
//! Stores implement [`Store`]; [`SqliteStore`] persists through sqlx and
//! [`MemoryStore`] backs tests and dry runs.

pub mod cli;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod identity;
pub mod matcher;
pub mod model;
pub mod reconcile;
pub mod status;
pub mod store;
pub mod upsert;
pub mod worker;

pub use coordinator::ImportCoordinator;
pub use error::{AssumptionFailure, InsertFailure, SyncError, SyncResult};
pub use filter::{Filter, Predicate};
pub use matcher::{FieldMatcher, FieldMatchers};
pub use model::{
    ListingStatus, LocalEvent, LocalModel, LocalPerformance, LocalVenue, PerformanceLifecycle,
    RemoteEvent, RemotePerformance, RemoteVenue,
};
pub use reconcile::{ParentRef, Reconcilable};
pub use status::{EntityKind, ImportSummary, ReferenceId, UpsertStatus};
pub use store::{MemoryStore, Schema, SqliteStore, Store};
pub use upsert::upsert;
pub use worker::{SyncHandle, SyncWorker};
