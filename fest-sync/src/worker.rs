//! Serialized sync worker
//!
//! Owns the [`ImportCoordinator`] inside one spawned task. Callers talk to it
//! through cloneable [`SyncHandle`]s over a bounded command queue, so every
//! mutation and the reads supporting it run one at a time against the store.

use crate::coordinator::ImportCoordinator;
use crate::error::{SyncError, SyncResult};
use crate::model::{LocalEvent, LocalPerformance, RemoteEvent};
use crate::status::UpsertStatus;
use crate::store::Store;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Pending commands before senders wait
const COMMAND_QUEUE_DEPTH: usize = 32;

type Reply<T> = oneshot::Sender<SyncResult<T>>;

enum Command {
    Import {
        events: Vec<RemoteEvent>,
        reply: Reply<Vec<UpsertStatus>>,
    },
    Commit {
        reply: Reply<()>,
    },
    Discard {
        reply: Reply<()>,
    },
    SetFavourite {
        event_code: String,
        favourite: bool,
        reply: Reply<bool>,
    },
    Events {
        favourites_only: bool,
        reply: Reply<Vec<LocalEvent>>,
    },
    Performances {
        event_code: String,
        reply: Reply<Vec<LocalPerformance>>,
    },
    Shutdown,
}

/// Running worker task
pub struct SyncWorker<S: Store + 'static> {
    handle: SyncHandle,
    task: JoinHandle<ImportCoordinator<S>>,
}

impl<S: Store + 'static> SyncWorker<S> {
    /// Move `coordinator` into a new task
    pub fn spawn(coordinator: ImportCoordinator<S>) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let task = tokio::spawn(run(coordinator, rx));
        info!("Sync worker started");
        Self {
            handle: SyncHandle { tx },
            task,
        }
    }

    pub fn handle(&self) -> SyncHandle {
        self.handle.clone()
    }

    /// Stop the task after queued commands drain and hand back the coordinator
    ///
    /// Staged but uncommitted changes stay staged in the returned coordinator.
    pub async fn shutdown(self) -> SyncResult<ImportCoordinator<S>> {
        // A closed queue means the task already ended; join it anyway
        let _ = self.handle.tx.send(Command::Shutdown).await;
        let coordinator = self.task.await.map_err(|_| SyncError::WorkerStopped)?;
        info!("Sync worker stopped");
        Ok(coordinator)
    }
}

async fn run<S: Store>(
    mut coordinator: ImportCoordinator<S>,
    mut rx: mpsc::Receiver<Command>,
) -> ImportCoordinator<S> {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Import { events, reply } => {
                let _ = reply.send(coordinator.import_snapshot(&events).await);
            }
            Command::Commit { reply } => {
                let _ = reply.send(coordinator.commit().await);
            }
            Command::Discard { reply } => {
                let _ = reply.send(coordinator.discard().await);
            }
            Command::SetFavourite {
                event_code,
                favourite,
                reply,
            } => {
                let _ = reply.send(coordinator.set_favourite(&event_code, favourite).await);
            }
            Command::Events {
                favourites_only,
                reply,
            } => {
                let result = if favourites_only {
                    coordinator.favourite_events().await
                } else {
                    coordinator.events().await
                };
                let _ = reply.send(result);
            }
            Command::Performances { event_code, reply } => {
                let _ = reply.send(coordinator.performances_for_event(&event_code).await);
            }
            Command::Shutdown => {
                debug!("Shutdown requested");
                break;
            }
        }
    }
    coordinator
}

/// Cloneable front end of a [`SyncWorker`]
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<Command>,
}

impl SyncHandle {
    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> SyncResult<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(command(reply))
            .await
            .map_err(|_| SyncError::WorkerStopped)?;
        response.await.map_err(|_| SyncError::WorkerStopped)?
    }

    pub async fn import_snapshot(&self, events: Vec<RemoteEvent>) -> SyncResult<Vec<UpsertStatus>> {
        self.request(|reply| Command::Import { events, reply }).await
    }

    pub async fn commit(&self) -> SyncResult<()> {
        self.request(|reply| Command::Commit { reply }).await
    }

    pub async fn discard(&self) -> SyncResult<()> {
        self.request(|reply| Command::Discard { reply }).await
    }

    pub async fn set_favourite(&self, event_code: impl Into<String>, favourite: bool) -> SyncResult<bool> {
        let event_code = event_code.into();
        self.request(|reply| Command::SetFavourite {
            event_code,
            favourite,
            reply,
        })
        .await
    }

    pub async fn events(&self) -> SyncResult<Vec<LocalEvent>> {
        self.request(|reply| Command::Events {
            favourites_only: false,
            reply,
        })
        .await
    }

    pub async fn favourite_events(&self) -> SyncResult<Vec<LocalEvent>> {
        self.request(|reply| Command::Events {
            favourites_only: true,
            reply,
        })
        .await
    }

    pub async fn performances_for_event(&self, event_code: impl Into<String>) -> SyncResult<Vec<LocalPerformance>> {
        let event_code = event_code.into();
        self.request(|reply| Command::Performances { event_code, reply })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RemoteVenue;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_handle_after_shutdown_reports_stopped() {
        let worker = SyncWorker::spawn(ImportCoordinator::new(MemoryStore::new()));
        let handle = worker.handle();
        worker.shutdown().await.unwrap();

        let err = handle.commit().await.unwrap_err();
        assert!(matches!(err, SyncError::WorkerStopped));
    }

    #[tokio::test]
    async fn test_shutdown_returns_staged_coordinator() {
        let worker = SyncWorker::spawn(ImportCoordinator::new(MemoryStore::new()));
        let handle = worker.handle();
        let event = RemoteEvent::new("E1", "Opening", RemoteVenue::new("V1", "Hall A"));
        handle.import_snapshot(vec![event]).await.unwrap();

        let coordinator = worker.shutdown().await.unwrap();
        assert!(coordinator.has_changes());
        assert_eq!(coordinator.store().len::<LocalEvent>(), 1);
    }
}
