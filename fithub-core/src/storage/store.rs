//! Local-first key-value store with best-effort remote mirroring.
//!
//! Every write lands in the local backend before the call returns. When a
//! remote was available at construction the write is also queued and
//! mirrored in the background (see [`SyncQueue`]).

use chrono::Utc;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::{Backends, LocalBackend, RemoteBackend, StorageMode};
use super::error::StoreError;
use super::file::validate_key;
use super::keys::{default_for, StorageKey};
use super::queue::{DrainReport, QueueEntry, SyncQueue, SyncStatus};
use super::snapshot::{Snapshot, StorageInfo};

/// Tracked size ceiling, in serialized bytes.
pub const MAX_STORAGE_SIZE: usize = 512 * 1024;
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_AUTO_SAVE_INTERVAL: Duration = Duration::from_secs(30);
pub const DATA_VERSION: &str = "1.0.0";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub max_size: usize,
    /// Longest a read or write waits for initialization to finish.
    pub init_timeout: Duration,
    /// Longest `shutdown` waits for the queue to drain.
    pub shutdown_timeout: Duration,
    pub version: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_size: MAX_STORAGE_SIZE,
            init_timeout: DEFAULT_INIT_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            version: DATA_VERSION.to_string(),
        }
    }
}

/// Change notifications broadcast to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Initialized { mode: StorageMode },
    Changed { key: String },
    Removed { key: String },
    Cleared,
    SyncStatus(SyncStatus),
}

#[derive(Debug, Clone)]
struct CachedValue {
    value: Value,
    /// Serialized form; its length is what counts against the budget.
    text: String,
}

impl CachedValue {
    fn parse(text: String) -> Option<Self> {
        let value = serde_json::from_str(&text).ok()?;
        Some(Self { value, text })
    }
}

struct Inner {
    config: StoreConfig,
    local: Arc<dyn LocalBackend>,
    remote: Option<Arc<dyn RemoteBackend>>,
    queue: Option<Arc<SyncQueue>>,
    cache: Mutex<HashMap<String, CachedValue>>,
    ready: watch::Sender<bool>,
    events: broadcast::Sender<StoreEvent>,
}

/// Handle to the store. Cloning is cheap and shares state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl Store {
    fn new(config: StoreConfig, backends: Backends) -> Self {
        let (events, _) = broadcast::channel(64);
        let (ready, _) = watch::channel(false);
        let remote = backends.remote().cloned();
        let queue = remote
            .as_ref()
            .map(|remote| Arc::new(SyncQueue::new(Arc::clone(remote), events.clone())));

        Self {
            inner: Arc::new(Inner {
                config,
                local: backends.local,
                remote,
                queue,
                cache: Mutex::new(HashMap::new()),
                ready,
                events,
            }),
        }
    }

    /// Creates a store and loads its data before returning.
    pub async fn open(config: StoreConfig, backends: Backends) -> Self {
        let store = Self::new(config, backends);
        store.initialize().await;
        store
    }

    /// Creates a store and loads its data in the background.
    ///
    /// Operations issued before loading finishes wait for it, bounded by
    /// `init_timeout`. Must be called within a tokio runtime.
    pub fn spawn(config: StoreConfig, backends: Backends) -> Self {
        let store = Self::new(config, backends);
        let loader = store.clone();
        tokio::spawn(async move { loader.initialize().await });
        store
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, CachedValue>> {
        self.inner.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: StoreEvent) {
        let _ = self.inner.events.send(event);
    }

    fn enqueue(&self, entry: QueueEntry) {
        if let Some(queue) = &self.inner.queue {
            queue.push(entry);
        }
    }

    fn kick(&self) {
        if let Some(queue) = &self.inner.queue {
            queue.kick();
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn mode(&self) -> StorageMode {
        if self.inner.queue.is_some() {
            StorageMode::Cloud
        } else {
            StorageMode::LocalOnly
        }
    }

    pub fn is_initialized(&self) -> bool {
        *self.inner.ready.borrow()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    async fn initialize(&self) {
        let local_keys = self.inner.local.keys().unwrap_or_else(|e| {
            warn!("Failed to list local keys: {}", e);
            Vec::new()
        });

        let mut keys: BTreeSet<String> = local_keys.into_iter().collect();
        keys.extend(StorageKey::ALL.iter().map(|k| k.as_str().to_string()));

        // In cloud mode the remote copy of a key is authoritative at load.
        let mut fetched: HashMap<String, CachedValue> = HashMap::new();
        if let Some(remote) = &self.inner.remote {
            let results = join_all(keys.iter().map(|key| {
                let remote = Arc::clone(remote);
                async move { (key.clone(), remote.get_item(key).await) }
            }))
            .await;

            let mut failures = 0;
            for (key, result) in results {
                match result {
                    Ok(Some(text)) => match CachedValue::parse(text) {
                        Some(cached) => {
                            fetched.insert(key, cached);
                        }
                        None => warn!("Ignoring unreadable remote value for {}", key),
                    },
                    Ok(None) => {}
                    Err(e) => {
                        failures += 1;
                        warn!("Failed to load {} from remote: {}", key, e);
                    }
                }
            }
            if failures == keys.len() {
                warn!("Remote load failed, using local data");
            }
        }

        let mut loaded = HashMap::new();
        for key in &keys {
            if fetched.contains_key(key) {
                continue;
            }
            match self.inner.local.get_item(key) {
                Ok(Some(text)) => match CachedValue::parse(text) {
                    Some(cached) => {
                        loaded.insert(key.clone(), cached);
                    }
                    None => warn!("Ignoring unreadable local value for {}", key),
                },
                Ok(None) => {}
                Err(e) => warn!("Failed to read local value for {}: {}", key, e),
            }
        }

        {
            let mut cache = self.cache();
            // Writes that raced ahead of loading win over loaded values.
            for (key, cached) in loaded {
                cache.entry(key).or_insert(cached);
            }
            for (key, cached) in fetched {
                if cache.contains_key(&key) {
                    continue;
                }
                let stale = match self.inner.local.get_item(&key) {
                    Ok(Some(text)) => text != cached.text,
                    _ => true,
                };
                if stale {
                    if let Err(e) = self.inner.local.set_item(&key, &cached.text) {
                        warn!("Failed to copy remote value for {} locally: {}", key, e);
                    }
                    debug!("Restored {} from remote", key);
                }
                cache.insert(key, cached);
            }
        }

        info!("Storage initialized in {} mode", self.mode());
        self.inner.ready.send_replace(true);
        self.emit(StoreEvent::Initialized { mode: self.mode() });
    }

    /// Waits for initialization, giving up after `init_timeout`.
    async fn wait_ready(&self) {
        let mut ready = self.inner.ready.subscribe();
        if *ready.borrow() {
            return;
        }
        let wait = async move { ready.wait_for(|ready| *ready).await.is_ok() };
        if tokio::time::timeout(self.inner.config.init_timeout, wait)
            .await
            .is_err()
        {
            warn!(
                "Storage not initialized after {:?}, continuing with partial data",
                self.inner.config.init_timeout
            );
        }
    }

    /// Returns the stored value, or the key's default when absent or null.
    pub async fn get(&self, key: &str) -> Value {
        self.wait_ready().await;
        match self.cache().get(key) {
            Some(cached) if !cached.value.is_null() => cached.value.clone(),
            _ => default_for(key),
        }
    }

    /// Like [`Store::get`], decoding into `T`.
    ///
    /// An absent or null value decodes from the key default. A stored value
    /// that does not decode is an error, so callers never write a default
    /// back over data they could not read.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        let value = self.get(key).await;
        serde_json::from_value(value).map_err(|e| {
            warn!("Stored value for {} did not decode: {}", key, e);
            StoreError::Serialization(e)
        })
    }

    /// Writes a value. Returns once the local write is durable.
    pub async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        validate_key(key)?;
        self.wait_ready().await;
        let text = serde_json::to_string(&value)?;

        {
            let mut cache = self.cache();
            let size: usize = cache.values().map(|c| c.text.len()).sum();
            let old = cache.get(key).map(|c| c.text.len()).unwrap_or(0);
            let needed = size - old + text.len();
            if needed > self.inner.config.max_size {
                return Err(StoreError::StorageFull {
                    needed,
                    limit: self.inner.config.max_size,
                });
            }

            self.inner.local.set_item(key, &text)?;
            self.enqueue(QueueEntry::set(key, text.clone()));
            cache.insert(key.to_string(), CachedValue { value, text });
        }

        self.emit(StoreEvent::Changed {
            key: key.to_string(),
        });
        self.kick();
        Ok(())
    }

    pub async fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.set(key, value).await
    }

    /// Removes a key locally; the remote removal is queued.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.wait_ready().await;
        {
            let mut cache = self.cache();
            self.inner.local.remove_item(key)?;
            cache.remove(key);
            self.enqueue(QueueEntry::remove(key));
        }

        self.emit(StoreEvent::Removed {
            key: key.to_string(),
        });
        self.kick();
        Ok(())
    }

    /// Removes every known key and every stored key.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.wait_ready().await;
        {
            let mut cache = self.cache();
            let mut keys: BTreeSet<String> = cache.keys().cloned().collect();
            keys.extend(self.inner.local.keys()?);
            keys.extend(StorageKey::ALL.iter().map(|k| k.as_str().to_string()));

            for key in &keys {
                self.inner.local.remove_item(key)?;
                cache.remove(key);
            }
            for key in keys {
                self.enqueue(QueueEntry::remove(key));
            }
        }

        info!("Cleared all stored data");
        self.emit(StoreEvent::Cleared);
        self.kick();
        Ok(())
    }

    /// Sum of the serialized sizes of every stored value.
    pub fn storage_size(&self) -> usize {
        self.cache().values().map(|c| c.text.len()).sum()
    }

    pub fn storage_info(&self) -> StorageInfo {
        let mut info = StorageInfo::new(self.storage_size(), self.inner.config.max_size);
        info.is_cloud_storage = self.mode() == StorageMode::Cloud;
        if let Some(queue) = &self.inner.queue {
            info.queue_length = queue.len();
            info.sync_status = queue.status();
            info.last_sync = queue.last_sync();
        }
        info
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.inner
            .queue
            .as_ref()
            .map(|q| q.status())
            .unwrap_or(SyncStatus::Idle)
    }

    pub fn queue_length(&self) -> usize {
        self.inner.queue.as_ref().map(|q| q.len()).unwrap_or(0)
    }

    pub async fn export_data(&self) -> Snapshot {
        self.wait_ready().await;
        let data: BTreeMap<String, Value> = self
            .cache()
            .iter()
            .map(|(k, c)| (k.clone(), c.value.clone()))
            .collect();

        Snapshot {
            version: self.inner.config.version.clone(),
            timestamp: Utc::now(),
            data,
            metadata: self.storage_info(),
        }
    }

    /// Replaces all data with a snapshot's.
    ///
    /// The snapshot is checked before anything is modified.
    pub async fn import_data(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        for key in snapshot.data.keys() {
            validate_key(key).map_err(|e| StoreError::InvalidSnapshot(e.to_string()))?;
        }
        let needed = snapshot.data_size()?;
        if needed > self.inner.config.max_size {
            return Err(StoreError::StorageFull {
                needed,
                limit: self.inner.config.max_size,
            });
        }

        self.clear().await?;
        for (key, value) in &snapshot.data {
            self.set(key, value.clone()).await?;
        }

        info!("Imported {} keys", snapshot.data.len());
        Ok(())
    }

    pub async fn import_json(&self, text: &str) -> Result<(), StoreError> {
        let snapshot = Snapshot::from_json(text)?;
        self.import_data(&snapshot).await
    }

    /// Queues every stored value for mirroring again without starting a pass.
    pub fn requeue_all(&self) {
        let Some(queue) = &self.inner.queue else {
            return;
        };
        let cache = self.cache();
        let mut keys: Vec<&String> = cache.keys().collect();
        keys.sort();
        for key in keys {
            queue.push(QueueEntry::set(key.as_str(), cache[key].text.as_str()));
        }
    }

    /// Queues every stored value for mirroring again and starts a pass.
    pub fn flush_all(&self) {
        self.requeue_all();
        if let Some(queue) = &self.inner.queue {
            queue.kick();
        }
    }

    /// Runs one drain pass now and reports what happened.
    pub async fn sync_now(&self) -> DrainReport {
        match &self.inner.queue {
            Some(queue) => queue.drain().await,
            None => DrainReport::default(),
        }
    }

    /// Flushes everything and waits (bounded) for the queue to drain.
    pub async fn shutdown(&self) -> DrainReport {
        self.flush_all();
        let timeout = self.inner.config.shutdown_timeout;
        match tokio::time::timeout(timeout, self.sync_now()).await {
            Ok(report) => report,
            Err(_) => {
                warn!("Remote sync did not finish within {:?}", timeout);
                DrainReport {
                    pushed: 0,
                    remaining: self.queue_length(),
                    failed: true,
                }
            }
        }
    }

    /// Periodically re-queues all data for mirroring.
    pub fn spawn_auto_save(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                debug!("Auto-save");
                store.flush_all();
            }
        })
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("mode", &self.mode())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
