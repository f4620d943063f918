//! FIFO queue of pending remote writes.
//!
//! Entries are applied to the remote strictly in enqueue order. A failed
//! entry goes back to the head of the queue and the pass stops, so later
//! entries never overtake it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::backend::RemoteBackend;
use super::store::StoreEvent;

/// One pending remote write. `None` removes the key remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub key: String,
    pub serialized_value: Option<String>,
}

impl QueueEntry {
    pub fn set(key: impl Into<String>, serialized_value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            serialized_value: Some(serialized_value.into()),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            serialized_value: None,
        }
    }
}

/// Mirroring state shown by the sync indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Synced,
    Error,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "idle"),
            SyncStatus::Syncing => write!(f, "syncing"),
            SyncStatus::Synced => write!(f, "synced"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}

/// Outcome of one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries applied to the remote.
    pub pushed: usize,
    /// Entries still queued afterwards.
    pub remaining: usize,
    /// Whether the pass stopped on a failed entry.
    pub failed: bool,
}

#[derive(Debug)]
struct SyncState {
    status: SyncStatus,
    last_sync: Option<DateTime<Utc>>,
}

pub struct SyncQueue {
    remote: Arc<dyn RemoteBackend>,
    entries: Mutex<VecDeque<QueueEntry>>,
    state: Mutex<SyncState>,
    // Held for the duration of a pass; at most one pass runs at a time.
    pass: tokio::sync::Mutex<()>,
    events: broadcast::Sender<StoreEvent>,
}

impl SyncQueue {
    pub fn new(remote: Arc<dyn RemoteBackend>, events: broadcast::Sender<StoreEvent>) -> Self {
        Self {
            remote,
            entries: Mutex::new(VecDeque::new()),
            state: Mutex::new(SyncState {
                status: SyncStatus::Idle,
                last_sync: None,
            }),
            pass: tokio::sync::Mutex::new(()),
            events,
        }
    }

    fn entries(&self) -> MutexGuard<'_, VecDeque<QueueEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, entry: QueueEntry) {
        debug!(
            "Queued remote {} for {}",
            if entry.serialized_value.is_some() { "write" } else { "removal" },
            entry.key
        );
        self.entries().push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Snapshot of the pending entries, head first.
    pub fn pending(&self) -> Vec<QueueEntry> {
        self.entries().iter().cloned().collect()
    }

    pub fn status(&self) -> SyncStatus {
        self.state().status
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.state().last_sync
    }

    fn set_status(&self, status: SyncStatus) {
        let changed = {
            let mut state = self.state();
            let changed = state.status != status;
            state.status = status;
            if status == SyncStatus::Synced {
                state.last_sync = Some(Utc::now());
            }
            changed
        };
        if changed {
            let _ = self.events.send(StoreEvent::SyncStatus(status));
        }
    }

    /// Starts a background pass unless one is already running.
    ///
    /// Without a tokio runtime the entries simply stay queued for a later
    /// trigger.
    pub fn kick(self: &Arc<Self>) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available, leaving {} entries queued", self.len());
            return;
        };

        let queue = Arc::clone(self);
        handle.spawn(async move {
            loop {
                let Ok(guard) = queue.pass.try_lock() else {
                    // The running pass picks up anything queued meanwhile.
                    return;
                };
                let report = queue.run_pass().await;
                drop(guard);

                if report.failed || queue.is_empty() {
                    return;
                }
            }
        });
    }

    /// Runs one pass inline, waiting for any pass already in progress.
    pub async fn drain(&self) -> DrainReport {
        let _guard = self.pass.lock().await;
        self.run_pass().await
    }

    async fn run_pass(&self) -> DrainReport {
        let mut report = DrainReport::default();

        if self.is_empty() {
            return report;
        }

        self.set_status(SyncStatus::Syncing);

        loop {
            // Never hold the entries lock across the remote call.
            let Some(entry) = self.entries().pop_front() else {
                break;
            };

            let result = match &entry.serialized_value {
                Some(value) => self.remote.set_item(&entry.key, value).await,
                None => self.remote.remove_item(&entry.key).await,
            };

            match result {
                Ok(()) => {
                    debug!("Mirrored {} to remote", entry.key);
                    report.pushed += 1;
                }
                Err(e) => {
                    warn!("Remote write for {} failed, will retry: {}", entry.key, e);
                    self.entries().push_front(entry);
                    report.failed = true;
                    break;
                }
            }
        }

        report.remaining = self.len();
        self.set_status(if report.failed {
            SyncStatus::Error
        } else {
            SyncStatus::Synced
        });

        report
    }
}

impl fmt::Debug for SyncQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncQueue")
            .field("len", &self.len())
            .field("status", &self.status())
            .finish()
    }
}
