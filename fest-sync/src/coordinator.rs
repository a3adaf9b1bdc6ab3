//! Batch import coordinator
//!
//! Drives the upsert engine over a whole snapshot in dependency order
//! (venue, event, performances) and retires performances that dropped out
//! of their event's listing. Every mutation is staged; [`commit`] is the
//! single point at which a batch becomes durable.
//!
//! [`commit`]: ImportCoordinator::commit

use crate::error::{AssumptionFailure, SyncError, SyncResult};
use crate::filter::Filter;
use crate::identity;
use crate::model::{
    LocalEvent, LocalPerformance, PerformanceLifecycle, RemoteEvent, RemotePerformance,
};
use crate::reconcile::Reconcilable;
use crate::status::{EntityKind, ImportSummary, ReferenceId, UpsertStatus};
use crate::store::Store;
use crate::upsert::upsert;
use chrono::Utc;
use std::borrow::Cow;
use tracing::{debug, info, warn};

/// Single writer for one store
pub struct ImportCoordinator<S: Store> {
    store: S,
}

impl<S: Store> ImportCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Reconcile one remote value of any kind
    pub async fn upsert<R: Reconcilable>(&mut self, remote: &R) -> SyncResult<UpsertStatus> {
        upsert(&mut self.store, remote).await
    }

    /// Reconcile a whole snapshot; nothing is committed
    ///
    /// Statuses come back in processing order: for each event its venue, the
    /// event, its listed performances, then any performances cancelled by the
    /// sweep. The first error aborts the batch, leaving earlier work staged.
    pub async fn import_snapshot(&mut self, events: &[RemoteEvent]) -> SyncResult<Vec<UpsertStatus>> {
        info!("Importing snapshot of {} events", events.len());
        let mut statuses = Vec::new();

        for event in events {
            statuses.push(self.upsert(&event.venue).await?);
            statuses.push(self.upsert(event).await?);

            for performance in &event.performances {
                let performance = owned_by(event, performance);
                statuses.push(self.upsert(&*performance).await?);
            }

            statuses.extend(self.sweep_cancelled(event).await?);
        }

        let summary = ImportSummary::from_statuses(&statuses);
        info!("Snapshot reconciled: {}", summary);
        Ok(statuses)
    }

    /// Cancel active performances of `event` that are no longer listed
    async fn sweep_cancelled(&mut self, event: &RemoteEvent) -> SyncResult<Vec<UpsertStatus>> {
        let filter = identity::active_performances_missing_from(&event.code, &event.performance_starts());
        let vanished: Vec<LocalPerformance> = self
            .store
            .fetch(&filter)
            .await
            .map_err(SyncError::FetchFailed)?;

        let mut statuses = Vec::with_capacity(vanished.len());
        for mut performance in vanished {
            performance.lifecycle = PerformanceLifecycle::Cancelled;
            self.store
                .update(&performance)
                .await
                .map_err(SyncError::WriteFailed)?;

            let reference = ReferenceId::new(
                EntityKind::Performance,
                identity::performance_key(&performance.event_code, performance.starts_at),
            );
            debug!(reference = %reference, "Cancelled performance missing from listing");
            statuses.push(UpsertStatus::Updated(reference));
        }
        Ok(statuses)
    }

    /// Persist everything staged since the last commit or discard
    pub async fn commit(&mut self) -> SyncResult<()> {
        if !self.store.has_changes() {
            debug!("Commit with nothing staged");
            return Ok(());
        }
        self.store.save().await.map_err(SyncError::SaveFailed)
    }

    /// Drop everything staged since the last commit
    pub async fn discard(&mut self) -> SyncResult<()> {
        self.store.discard().await.map_err(SyncError::SaveFailed)
    }

    pub fn has_changes(&self) -> bool {
        self.store.has_changes()
    }

    /// Mark or unmark an event as a favourite
    ///
    /// Returns `false` when no event has this code. Staged; needs a commit.
    pub async fn set_favourite(&mut self, event_code: &str, favourite: bool) -> SyncResult<bool> {
        let mut events: Vec<LocalEvent> = self
            .store
            .fetch(&identity::event_by_code(event_code))
            .await
            .map_err(SyncError::FetchFailed)?;

        if events.len() > 1 {
            return Err(AssumptionFailure::MultipleModelsForSingle {
                reference: ReferenceId::new(EntityKind::Event, event_code),
                count: events.len(),
            }
            .into());
        }
        let Some(mut event) = events.pop() else {
            warn!("No event with code {}", event_code);
            return Ok(false);
        };

        if event.is_favourite == favourite {
            return Ok(true);
        }

        event.is_favourite = favourite;
        event.favourited_at = favourite.then(Utc::now);
        self.store
            .update(&event)
            .await
            .map_err(SyncError::WriteFailed)?;
        info!("Event {} favourite = {}", event_code, favourite);
        Ok(true)
    }

    /// Every local event, ordered by code
    pub async fn events(&mut self) -> SyncResult<Vec<LocalEvent>> {
        let mut events: Vec<LocalEvent> = self
            .store
            .fetch(&Filter::all())
            .await
            .map_err(SyncError::FetchFailed)?;
        events.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(events)
    }

    /// Favourite events, most recently favourited first
    pub async fn favourite_events(&mut self) -> SyncResult<Vec<LocalEvent>> {
        let mut events = self
            .store
            .fetch(&identity::favourite_events())
            .await
            .map_err(SyncError::FetchFailed)?;
        events.sort_by(|a, b| {
            b.favourited_at
                .cmp(&a.favourited_at)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(events)
    }

    /// Performances of one event in start order, cancelled ones included
    pub async fn performances_for_event(&mut self, event_code: &str) -> SyncResult<Vec<LocalPerformance>> {
        let mut performances = self
            .store
            .fetch(&identity::performances_of_event(event_code))
            .await
            .map_err(SyncError::FetchFailed)?;
        performances.sort_by_key(|p| p.starts_at);
        Ok(performances)
    }
}

/// The performance as listed under `event`, carrying the event's code
fn owned_by<'a>(event: &RemoteEvent, performance: &'a RemotePerformance) -> Cow<'a, RemotePerformance> {
    if performance.event_code == event.code {
        return Cow::Borrowed(performance);
    }
    if !performance.event_code.is_empty() {
        warn!(
            "Performance at {} lists event {} but is nested under {}",
            performance.starts_at, performance.event_code, event.code
        );
    }
    let mut adopted = performance.clone();
    adopted.event_code = event.code.clone();
    Cow::Owned(adopted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListingStatus, RemoteVenue};
    use crate::store::MemoryStore;
    use chrono::{DateTime, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, hour, 0, 0).unwrap()
    }

    fn event(hours: &[u32]) -> RemoteEvent {
        hours.iter().fold(
            RemoteEvent::new("E1", "Opening Night", RemoteVenue::new("V1", "Hall A")),
            |event, hour| event.with_performance_at(at(*hour)),
        )
    }

    #[tokio::test]
    async fn test_first_import_inserts_everything() {
        let mut coordinator = ImportCoordinator::new(MemoryStore::new());
        let statuses = coordinator.import_snapshot(&[event(&[10, 11])]).await.unwrap();

        assert_eq!(statuses.len(), 4);
        assert!(statuses.iter().all(UpsertStatus::is_inserted));
        assert_eq!(
            statuses.iter().filter_map(UpsertStatus::kind).collect::<Vec<_>>(),
            vec![
                EntityKind::Venue,
                EntityKind::Event,
                EntityKind::Performance,
                EntityKind::Performance
            ]
        );
    }

    #[tokio::test]
    async fn test_nested_performance_takes_owning_event_code() {
        let mut coordinator = ImportCoordinator::new(MemoryStore::new());
        let mut listed = event(&[]);
        listed.performances.push(RemotePerformance::new("E9", at(10)));

        let statuses = coordinator.import_snapshot(&[listed]).await.unwrap();
        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().all(UpsertStatus::is_inserted));

        let performances = coordinator.performances_for_event("E1").await.unwrap();
        assert_eq!(performances.len(), 1);
        assert_eq!(performances[0].event_code, "E1");
        assert!(coordinator.performances_for_event("E9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_cancels_only_vanished_performance() {
        let mut coordinator = ImportCoordinator::new(MemoryStore::new());
        coordinator.import_snapshot(&[event(&[10, 11])]).await.unwrap();
        coordinator.commit().await.unwrap();

        let statuses = coordinator.import_snapshot(&[event(&[10])]).await.unwrap();
        let updated: Vec<_> = statuses.iter().filter(|s| s.is_updated()).collect();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].kind(), Some(EntityKind::Performance));

        let performances = coordinator.performances_for_event("E1").await.unwrap();
        assert_eq!(performances.len(), 2);
        assert_eq!(performances[0].lifecycle, PerformanceLifecycle::Active);
        assert_eq!(performances[1].lifecycle, PerformanceLifecycle::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_performance_is_not_cancelled_twice() {
        let mut coordinator = ImportCoordinator::new(MemoryStore::new());
        coordinator.import_snapshot(&[event(&[10])]).await.unwrap();
        coordinator.import_snapshot(&[event(&[])]).await.unwrap();

        let statuses = coordinator.import_snapshot(&[event(&[])]).await.unwrap();
        assert!(statuses.iter().all(UpsertStatus::is_no_change));
    }

    #[tokio::test]
    async fn test_nested_performance_without_code_is_adopted() {
        let mut listed = event(&[]);
        listed.performances.push(RemotePerformance {
            listing_status: ListingStatus::SoldOut,
            ..RemotePerformance::new("", at(20))
        });

        let mut coordinator = ImportCoordinator::new(MemoryStore::new());
        coordinator.import_snapshot(&[listed]).await.unwrap();

        let performances = coordinator.performances_for_event("E1").await.unwrap();
        assert_eq!(performances.len(), 1);
        assert_eq!(performances[0].event_code, "E1");
        assert_eq!(performances[0].listing_status, ListingStatus::SoldOut);
    }

    #[tokio::test]
    async fn test_set_favourite_unknown_event() {
        let mut coordinator = ImportCoordinator::new(MemoryStore::new());
        assert!(!coordinator.set_favourite("E404", true).await.unwrap());
        assert!(!coordinator.has_changes());
    }

    #[tokio::test]
    async fn test_set_favourite_round_trip() {
        let mut coordinator = ImportCoordinator::new(MemoryStore::new());
        coordinator.import_snapshot(&[event(&[10])]).await.unwrap();

        assert!(coordinator.set_favourite("E1", true).await.unwrap());
        let favourites = coordinator.favourite_events().await.unwrap();
        assert_eq!(favourites.len(), 1);
        assert!(favourites[0].favourited_at.is_some());

        assert!(coordinator.set_favourite("E1", false).await.unwrap());
        assert!(coordinator.favourite_events().await.unwrap().is_empty());
        assert_eq!(coordinator.events().await.unwrap()[0].favourited_at, None);
    }

    #[tokio::test]
    async fn test_discard_drops_staged_batch() {
        let mut coordinator = ImportCoordinator::new(MemoryStore::new());
        coordinator.import_snapshot(&[event(&[10])]).await.unwrap();
        coordinator.discard().await.unwrap();

        assert!(coordinator.events().await.unwrap().is_empty());
        assert_eq!(coordinator.store().committed_len::<LocalEvent>(), 0);
    }
}
