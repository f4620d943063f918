//! Backend abstractions the store writes through.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::BackendError;

/// Synchronous, authoritative storage on this device.
///
/// Values are opaque serialized text. Every error is a hard failure of that
/// single operation.
pub trait LocalBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError>;
    fn remove_item(&self, key: &str) -> Result<(), BackendError>;
    fn keys(&self) -> Result<Vec<String>, BackendError>;
}

/// Asynchronous, best-effort mirror of the local data.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Checks that the remote is reachable and usable.
    async fn probe(&self) -> Result<(), BackendError>;
    async fn get_item(&self, key: &str) -> Result<Option<String>, BackendError>;
    async fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError>;
    async fn remove_item(&self, key: &str) -> Result<(), BackendError>;
    async fn keys(&self) -> Result<Vec<String>, BackendError>;
}

/// Where writes end up for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Local writes mirrored to the remote.
    Cloud,
    /// Remote absent or unusable; local only.
    LocalOnly,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Cloud => write!(f, "cloud"),
            StorageMode::LocalOnly => write!(f, "local"),
        }
    }
}

/// The pair of backends chosen for a store.
#[derive(Clone)]
pub struct Backends {
    pub local: Arc<dyn LocalBackend>,
    remote: Option<Arc<dyn RemoteBackend>>,
}

impl Backends {
    pub fn local_only(local: Arc<dyn LocalBackend>) -> Self {
        Self {
            local,
            remote: None,
        }
    }

    /// Probes the remote once and keeps it only when the probe succeeds.
    pub async fn detect(local: Arc<dyn LocalBackend>, remote: Option<Arc<dyn RemoteBackend>>) -> Self {
        let remote = match remote {
            Some(remote) => match remote.probe().await {
                Ok(()) => {
                    info!("Remote storage available, using cloud mode");
                    Some(remote)
                }
                Err(e) => {
                    warn!("Remote storage unavailable, using local mode: {}", e);
                    None
                }
            },
            None => {
                info!("No remote storage configured, using local mode");
                None
            }
        };

        Self { local, remote }
    }

    pub fn remote(&self) -> Option<&Arc<dyn RemoteBackend>> {
        self.remote.as_ref()
    }

    pub fn mode(&self) -> StorageMode {
        if self.remote.is_some() {
            StorageMode::Cloud
        } else {
            StorageMode::LocalOnly
        }
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backends")
            .field("mode", &self.mode())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{MemoryBackend, MemoryRemote};

    #[tokio::test]
    async fn test_detect_without_remote() {
        let backends = Backends::detect(Arc::new(MemoryBackend::new()), None).await;
        assert_eq!(backends.mode(), StorageMode::LocalOnly);
        assert!(backends.remote().is_none());
    }

    #[tokio::test]
    async fn test_detect_with_working_remote() {
        let remote: Arc<dyn RemoteBackend> = Arc::new(MemoryRemote::new());
        let backends = Backends::detect(Arc::new(MemoryBackend::new()), Some(remote)).await;
        assert_eq!(backends.mode(), StorageMode::Cloud);
    }

    #[tokio::test]
    async fn test_detect_with_failing_probe() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);
        let remote: Arc<dyn RemoteBackend> = Arc::new(remote);
        let backends = Backends::detect(Arc::new(MemoryBackend::new()), Some(remote)).await;
        assert_eq!(backends.mode(), StorageMode::LocalOnly);
    }
}
