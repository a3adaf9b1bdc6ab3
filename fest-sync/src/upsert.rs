//! Upsert engine
//!
//! Reconciles a single remote value into the store:
//!
//! 1. Fetch local records by natural key. More than one is a broken store.
//! 2. One match: compare remote-owned fields. Equal means no write at all;
//!    otherwise the local record is overwritten in place and staged.
//! 3. No match: resolve the parent by its natural key, insert a fresh record
//!    and verify the store now manages it.
//!
//! Nothing is retried. Nothing is committed here; see
//! [`crate::coordinator::ImportCoordinator::commit`].

use crate::error::{AssumptionFailure, InsertFailure, SyncError, SyncResult};
use crate::identity;
use crate::model::{LocalEvent, LocalModel, LocalVenue};
use crate::reconcile::{ParentRef, Reconcilable};
use crate::status::{EntityKind, ReferenceId, UpsertStatus};
use crate::store::Store;
use tracing::{debug, error};
use uuid::Uuid;

/// Insert, update or leave alone the local counterpart of `remote`
pub async fn upsert<S, R>(store: &mut S, remote: &R) -> SyncResult<UpsertStatus>
where
    S: Store,
    R: Reconcilable,
{
    let reference = remote.reference_id();
    let mut matches = store
        .fetch(&remote.identity_filter())
        .await
        .map_err(SyncError::FetchFailed)?;

    if matches.len() > 1 {
        error!(reference = %reference, count = matches.len(), "Natural key is not unique in store");
        return Err(AssumptionFailure::MultipleModelsForSingle {
            reference,
            count: matches.len(),
        }
        .into());
    }

    if let Some(mut local) = matches.pop() {
        let matchers = R::field_matchers();
        let changed = matchers.mismatched(&local, remote);
        if changed.is_empty() {
            debug!(reference = %reference, "No change");
            return Ok(UpsertStatus::NoChange);
        }

        debug!(reference = %reference, fields = ?changed, "Updating");
        remote.update_local(&mut local);
        store
            .update(&local)
            .await
            .map_err(SyncError::WriteFailed)?;
        return Ok(UpsertStatus::Updated(reference));
    }

    let parent_id = match remote.parent() {
        Some(parent) => Some(resolve_parent(store, &parent).await?),
        None => None,
    };

    let kind = R::Local::KIND;
    if !store.schema().supports(kind) {
        error!(reference = %reference, "Entity kind missing from store schema");
        return Err(SyncError::InsertFailed {
            kind,
            reason: InsertFailure::ModelNotFoundInSchema,
        });
    }

    let local = remote.create_local(parent_id);
    store
        .insert(&local)
        .await
        .map_err(SyncError::WriteFailed)?;

    let managed = store
        .is_managed::<R::Local>(local.guid())
        .await
        .map_err(SyncError::FetchFailed)?;
    if !managed {
        error!(reference = %reference, guid = %local.guid(), "Inserted record not visible in store");
        return Err(SyncError::InsertFailed {
            kind,
            reason: InsertFailure::ModelDidNotInsertIntoContext,
        });
    }

    debug!(reference = %reference, guid = %local.guid(), "Inserted");
    Ok(UpsertStatus::Inserted(reference))
}

/// Guid of the single local parent named by `parent`
async fn resolve_parent<S: Store>(store: &mut S, parent: &ParentRef) -> SyncResult<Uuid> {
    let (guids, reference) = match parent {
        ParentRef::Venue(code) => {
            let venues: Vec<LocalVenue> = store
                .fetch(&identity::venue_by_code(code))
                .await
                .map_err(SyncError::FetchFailed)?;
            (
                venues.iter().map(|v| v.guid).collect::<Vec<_>>(),
                ReferenceId::new(EntityKind::Venue, code.as_str()),
            )
        }
        ParentRef::Event(code) => {
            let events: Vec<LocalEvent> = store
                .fetch(&identity::event_by_code(code))
                .await
                .map_err(SyncError::FetchFailed)?;
            (
                events.iter().map(|e| e.guid).collect::<Vec<_>>(),
                ReferenceId::new(EntityKind::Event, code.as_str()),
            )
        }
    };

    match guids.as_slice() {
        [guid] => Ok(*guid),
        [] => {
            error!(parent = %reference, "Parent not created before child");
            let failure = match parent {
                ParentRef::Venue(code) => AssumptionFailure::ExpectedCreatedVenue { code: code.clone() },
                ParentRef::Event(code) => AssumptionFailure::ExpectedCreatedEvent { code: code.clone() },
            };
            Err(failure.into())
        }
        _ => Err(AssumptionFailure::MultipleModelsForSingle {
            count: guids.len(),
            reference,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use crate::model::{LocalPerformance, RemoteEvent, RemotePerformance, RemoteVenue};
    use crate::store::{MemoryStore, Schema};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    /// Accepts inserts without registering them
    struct DroppingStore(MemoryStore);

    #[async_trait]
    impl Store for DroppingStore {
        fn schema(&self) -> &Schema {
            self.0.schema()
        }

        async fn fetch<L: LocalModel>(&mut self, filter: &Filter<L>) -> fest_common::Result<Vec<L>> {
            self.0.fetch(filter).await
        }

        async fn insert<L: LocalModel>(&mut self, _record: &L) -> fest_common::Result<()> {
            Ok(())
        }

        async fn update<L: LocalModel>(&mut self, record: &L) -> fest_common::Result<()> {
            self.0.update(record).await
        }

        async fn is_managed<L: LocalModel>(&mut self, guid: Uuid) -> fest_common::Result<bool> {
            self.0.is_managed::<L>(guid).await
        }

        async fn save(&mut self) -> fest_common::Result<()> {
            self.0.save().await
        }

        async fn discard(&mut self) -> fest_common::Result<()> {
            self.0.discard().await
        }

        fn has_changes(&self) -> bool {
            self.0.has_changes()
        }
    }

    fn venue_row(code: &str) -> LocalVenue {
        RemoteVenue::new(code, "Hall A").create_local(None)
    }

    #[tokio::test]
    async fn test_venue_insert_update_no_change() {
        let mut store = MemoryStore::new();

        let status = upsert(&mut store, &RemoteVenue::new("V1", "Hall A")).await.unwrap();
        assert_eq!(status, UpsertStatus::Inserted(ReferenceId::new(EntityKind::Venue, "V1")));
        let guid = store.fetch(&identity::venue_by_code("V1")).await.unwrap()[0].guid;

        let status = upsert(&mut store, &RemoteVenue::new("V1", "Hall B")).await.unwrap();
        assert_eq!(status, UpsertStatus::Updated(ReferenceId::new(EntityKind::Venue, "V1")));

        let status = upsert(&mut store, &RemoteVenue::new("V1", "Hall B")).await.unwrap();
        assert_eq!(status, UpsertStatus::NoChange);

        let venues = store.fetch(&identity::venue_by_code("V1")).await.unwrap();
        assert_eq!(venues.len(), 1);
        assert_eq!(venues[0].guid, guid);
        assert_eq!(venues[0].name, "Hall B");
    }

    #[tokio::test]
    async fn test_no_change_does_not_stage_write() {
        let mut store = MemoryStore::new();
        upsert(&mut store, &RemoteVenue::new("V1", "Hall A")).await.unwrap();
        store.save().await.unwrap();

        let status = upsert(&mut store, &RemoteVenue::new("V1", "Hall A")).await.unwrap();
        assert!(status.is_no_change());
        assert!(!store.has_changes());
    }

    #[tokio::test]
    async fn test_event_without_venue_fails() {
        let mut store = MemoryStore::new();
        let event = RemoteEvent::new("E1", "Opening", RemoteVenue::new("V9", "Nowhere"));

        let err = upsert(&mut store, &event).await.unwrap_err();
        assert_eq!(
            err.assumption(),
            Some(&AssumptionFailure::ExpectedCreatedVenue { code: "V9".to_string() })
        );
        assert_eq!(store.len::<LocalEvent>(), 0);
    }

    #[tokio::test]
    async fn test_performance_without_event_fails() {
        let mut store = MemoryStore::new();
        let starts_at = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();

        let err = upsert(&mut store, &RemotePerformance::new("E1", starts_at))
            .await
            .unwrap_err();
        assert_eq!(
            err.assumption(),
            Some(&AssumptionFailure::ExpectedCreatedEvent { code: "E1".to_string() })
        );
        assert_eq!(store.len::<LocalPerformance>(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_natural_key_is_assumption_failure() {
        let mut store = MemoryStore::new();
        store.seed(&venue_row("V1"));
        store.seed(&venue_row("V1"));

        let err = upsert(&mut store, &RemoteVenue::new("V1", "Hall A"))
            .await
            .unwrap_err();
        assert_eq!(
            err.assumption(),
            Some(&AssumptionFailure::MultipleModelsForSingle {
                reference: ReferenceId::new(EntityKind::Venue, "V1"),
                count: 2,
            })
        );
    }

    #[tokio::test]
    async fn test_duplicate_parent_is_assumption_failure() {
        let mut store = MemoryStore::new();
        store.seed(&venue_row("V1"));
        store.seed(&venue_row("V1"));

        let event = RemoteEvent::new("E1", "Opening", RemoteVenue::new("V1", "Hall A"));
        let err = upsert(&mut store, &event).await.unwrap_err();
        assert!(matches!(
            err.assumption(),
            Some(AssumptionFailure::MultipleModelsForSingle { count: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_kind_missing_from_schema() {
        let mut store = MemoryStore::with_schema(Schema::new([EntityKind::Event]));
        let err = upsert(&mut store, &RemoteVenue::new("V1", "Hall A"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::InsertFailed {
                kind: EntityKind::Venue,
                reason: InsertFailure::ModelNotFoundInSchema,
            }
        ));
    }

    #[tokio::test]
    async fn test_insert_not_registered() {
        let mut store = DroppingStore(MemoryStore::new());
        let err = upsert(&mut store, &RemoteVenue::new("V1", "Hall A"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::InsertFailed {
                kind: EntityKind::Venue,
                reason: InsertFailure::ModelDidNotInsertIntoContext,
            }
        ));
    }
}
