//! Error types for the reconciliation engine
//!
//! Only genuine failures are errors. `NoChange`, `Inserted` and `Updated`
//! are normal outcomes and live in [`crate::status::UpsertStatus`].

use crate::status::{EntityKind, ReferenceId};
use thiserror::Error;

/// Result type for engine operations
pub type SyncResult<T> = Result<T, SyncError>;

/// A broken store or ordering invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssumptionFailure {
    /// Identity resolution matched more than one local record
    #[error("{count} local records match {reference}, expected at most one")]
    MultipleModelsForSingle { reference: ReferenceId, count: usize },

    /// An event was upserted before its venue
    #[error("venue {code} must be created before its events")]
    ExpectedCreatedVenue { code: String },

    /// A performance was upserted before its event
    #[error("event {code} must be created before its performances")]
    ExpectedCreatedEvent { code: String },
}

/// Why an insert could not be verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertFailure {
    #[error("entity kind is not part of the store schema")]
    ModelNotFoundInSchema,

    #[error("store did not register the inserted record")]
    ModelDidNotInsertIntoContext,
}

/// Engine error
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading from the store failed
    #[error("Fetch failed: {0}")]
    FetchFailed(#[source] fest_common::Error),

    /// Committing staged mutations failed; nothing from the batch was persisted
    #[error("Save failed: {0}")]
    SaveFailed(#[source] fest_common::Error),

    /// The store rejected a staged insert or update
    #[error("Write failed: {0}")]
    WriteFailed(#[source] fest_common::Error),

    #[error("Assumption failed: {0}")]
    AssumptionFailed(#[from] AssumptionFailure),

    #[error("Insert of {kind} failed: {reason}")]
    InsertFailed {
        kind: EntityKind,
        reason: InsertFailure,
    },

    /// The serialized sync worker is no longer running
    #[error("Sync worker stopped")]
    WorkerStopped,
}

impl SyncError {
    /// The assumption that failed, if this is an assumption error
    pub fn assumption(&self) -> Option<&AssumptionFailure> {
        match self {
            SyncError::AssumptionFailed(failure) => Some(failure),
            _ => None,
        }
    }
}
