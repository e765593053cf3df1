//! Offline sync: drain the local queue to the API when connectivity returns.
//!
//! A drain cycle walks a small state machine:
//!
//! ```text
//!   Idle ──signal──▶ Draining ──empty──▶ Idle
//!                       │
//!                       └─non-empty─▶ AwaitingServerAck ──ok──▶ clear + confirm ─▶ Idle
//!                                             └──────────err──▶ keep queue, log ─▶ Idle
//! ```
//!
//! Only one cycle runs at a time. A signal that arrives while a cycle is in
//! flight is dropped, not queued; the next restore edge starts a new cycle.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::client::{ApiClient, UploadError};
use crate::network::NetworkStatus;
use crate::offline_queue::OfflineQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Draining,
    AwaitingServerAck,
}

/// Result of one call to [`SyncCoordinator::drain_cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another cycle was already in flight; nothing was done.
    Busy,
    /// The queue was empty; nothing was sent.
    Empty,
    /// This many submissions were accepted and removed locally.
    Submitted(usize),
    /// The upload (or a local read) failed; the queue is unchanged.
    Failed,
}

/// Destination for a drained batch.
#[async_trait]
pub trait BatchUploader: Send + Sync {
    async fn upload_batch(&self, batch: &[Value]) -> Result<(), UploadError>;
}

#[async_trait]
impl BatchUploader for ApiClient {
    async fn upload_batch(&self, batch: &[Value]) -> Result<(), UploadError> {
        self.create_pizzas(batch).await.map(|_| ())
    }
}

/// User-facing confirmation after a successful drain.
pub trait Notifier: Send + Sync {
    fn batch_submitted(&self, count: usize);
}

/// Prints the confirmation on stdout.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn batch_submitted(&self, count: usize) {
        println!("All saved pizza has been submitted! ({count} sent)");
    }
}

pub struct SyncCoordinator {
    queue: Arc<OfflineQueue>,
    uploader: Arc<dyn BatchUploader>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SyncState>,
}

/// Puts the coordinator back to `Idle` when a cycle ends, including when
/// the cycle's future is dropped part-way.
struct CycleGuard<'a> {
    state: &'a Mutex<SyncState>,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = SyncState::Idle;
    }
}

impl SyncCoordinator {
    pub fn new(
        queue: Arc<OfflineQueue>,
        uploader: Arc<dyn BatchUploader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            queue,
            uploader,
            notifier,
            state: Mutex::new(SyncState::Idle),
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: SyncState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// `Idle -> Draining`, or `None` if a cycle is already running.
    fn try_begin(&self) -> Option<CycleGuard<'_>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != SyncState::Idle {
            return None;
        }
        *state = SyncState::Draining;
        Some(CycleGuard { state: &self.state })
    }

    /// Run one drain cycle: read the whole queue, upload it as one batch,
    /// and remove the uploaded entries only once the server accepted them.
    ///
    /// Never returns an error; failures are logged and reported as
    /// [`DrainOutcome::Failed`] with the queue left as it was.
    pub async fn drain_cycle(&self) -> DrainOutcome {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!("drain already in flight, ignoring signal");
            return DrainOutcome::Busy;
        };

        let pending = match self.queue.drain_all() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(error = %e, "could not read offline queue");
                return DrainOutcome::Failed;
            }
        };
        let Some(last_local_id) = pending.last().map(|p| p.local_id) else {
            tracing::debug!("offline queue empty, nothing to upload");
            return DrainOutcome::Empty;
        };

        self.set_state(SyncState::AwaitingServerAck);
        let count = pending.len();
        let batch: Vec<Value> = pending.into_iter().map(|p| p.payload).collect();
        tracing::info!(count, "uploading offline submissions");

        if let Err(e) = self.uploader.upload_batch(&batch).await {
            tracing::warn!(error = %e, count, "batch upload failed, keeping offline queue");
            return DrainOutcome::Failed;
        }

        // Only the entries that were part of this batch; anything queued
        // while the upload was in flight waits for the next cycle.
        match self.queue.clear_through(last_local_id) {
            Ok(_) => {
                tracing::info!(count, "offline submissions accepted");
                self.notifier.batch_submitted(count);
                DrainOutcome::Submitted(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "batch accepted but offline queue could not be cleared");
                DrainOutcome::Failed
            }
        }
    }

    /// Follow connectivity changes and start a drain cycle on every edge
    /// into `Online`. A receiver that already reads `Online` when this
    /// starts counts as such an edge.
    ///
    /// Each cycle runs on its own task so signals keep being observed (and
    /// ignored) while an upload is pending. Returns when the sender is
    /// dropped.
    pub async fn run(self: Arc<Self>, mut status: watch::Receiver<NetworkStatus>) {
        let mut previous = NetworkStatus::Unknown;
        loop {
            let current = *status.borrow_and_update();
            if current == NetworkStatus::Online && previous != NetworkStatus::Online {
                let coordinator = Arc::clone(&self);
                tokio::spawn(async move {
                    coordinator.drain_cycle().await;
                });
            }
            previous = current;

            if status.changed().await.is_err() {
                break;
            }
        }
    }
}
