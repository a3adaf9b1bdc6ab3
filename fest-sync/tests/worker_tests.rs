//! Serialized worker: concurrent callers through cloned handles

mod helpers;

use fest_sync::{
    ImportCoordinator, LocalEvent, LocalPerformance, LocalVenue, MemoryStore, SyncWorker,
};
use helpers::{count_rows, create_test_store, event};
use tokio::task::JoinSet;

#[tokio::test]
async fn test_concurrent_imports_never_duplicate() {
    let worker = SyncWorker::spawn(ImportCoordinator::new(MemoryStore::new()));
    let snapshot = vec![event("E1", &[10, 11]), event("E2", &[12])];

    let mut join_set = JoinSet::new();
    for _ in 0..8 {
        let handle = worker.handle();
        let snapshot = snapshot.clone();
        join_set.spawn(async move { handle.import_snapshot(snapshot).await });
    }

    let mut inserted = 0;
    while let Some(result) = join_set.join_next().await {
        let statuses = result.expect("task panicked").expect("import failed");
        inserted += statuses.iter().filter(|s| s.is_inserted()).count();
    }
    // Only the first import to run inserts anything
    assert_eq!(inserted, 6);

    let coordinator = worker.shutdown().await.unwrap();
    let store = coordinator.store();
    assert_eq!(store.len::<LocalVenue>(), 1);
    assert_eq!(store.len::<LocalEvent>(), 2);
    assert_eq!(store.len::<LocalPerformance>(), 3);
}

#[tokio::test]
async fn test_concurrent_import_and_commit_on_sqlite() {
    let (_temp_dir, store, _path) = create_test_store().await.unwrap();
    let pool = store.pool().clone();
    let worker = SyncWorker::spawn(ImportCoordinator::new(store));

    let mut join_set = JoinSet::new();
    for hour in [10, 11, 12, 13] {
        let handle = worker.handle();
        join_set.spawn(async move {
            handle.import_snapshot(vec![event("E1", &[hour])]).await?;
            handle.commit().await
        });
    }
    while let Some(result) = join_set.join_next().await {
        result.expect("task panicked").expect("import failed");
    }

    assert_eq!(count_rows(&pool, "venues").await.unwrap(), 1);
    assert_eq!(count_rows(&pool, "events").await.unwrap(), 1);
    // Each listing cancels the others, but nothing is ever deleted
    assert_eq!(count_rows(&pool, "performances").await.unwrap(), 4);

    let handle = worker.handle();
    let performances = handle.performances_for_event("E1").await.unwrap();
    assert_eq!(performances.iter().filter(|p| p.is_active()).count(), 1);

    worker.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_favourite_through_handle() {
    let worker = SyncWorker::spawn(ImportCoordinator::new(MemoryStore::new()));
    let handle = worker.handle();

    handle.import_snapshot(vec![event("E1", &[10]), event("E2", &[11])]).await.unwrap();
    assert!(handle.set_favourite("E2", true).await.unwrap());
    assert!(!handle.set_favourite("E9", true).await.unwrap());
    handle.commit().await.unwrap();

    let favourites = handle.favourite_events().await.unwrap();
    assert_eq!(favourites.len(), 1);
    assert_eq!(favourites[0].code, "E2");
    assert_eq!(handle.events().await.unwrap().len(), 2);

    let coordinator = worker.shutdown().await.unwrap();
    assert!(!coordinator.has_changes());
}
