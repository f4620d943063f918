//! In-memory backends.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::backend::LocalBackend;
use super::error::BackendError;

/// Local backend kept in process memory, optionally size-limited.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<BTreeMap<String, String>>,
    quota: Option<u64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: u64) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota: Some(quota),
        }
    }

    fn items(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LocalBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut items = self.items();
        if let Some(quota) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = (others + value.len()) as u64;
            if needed > quota {
                return Err(BackendError::QuotaExceeded { needed, quota });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        self.items().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.items().keys().cloned().collect())
    }
}

#[cfg(test)]
pub(crate) use remote::MemoryRemote;

#[cfg(test)]
mod remote {
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::storage::backend::RemoteBackend;
    use crate::storage::error::BackendError;

    /// Remote stand-in that records every write and can be told to fail.
    #[derive(Debug, Default)]
    pub struct MemoryRemote {
        items: Mutex<BTreeMap<String, String>>,
        log: Mutex<Vec<(String, Option<String>)>>,
        offline: AtomicBool,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
        write_attempts: AtomicUsize,
        read_delay: Mutex<Option<Duration>>,
    }

    impl MemoryRemote {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_items(items: &[(&str, &str)]) -> Self {
            let remote = Self::new();
            {
                let mut map = remote.items.lock().unwrap();
                for (k, v) in items {
                    map.insert(k.to_string(), v.to_string());
                }
            }
            remote
        }

        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        pub fn set_read_delay(&self, delay: Duration) {
            *self.read_delay.lock().unwrap() = Some(delay);
        }

        pub fn item(&self, key: &str) -> Option<String> {
            self.items.lock().unwrap().get(key).cloned()
        }

        /// Successful writes in the order they were applied.
        pub fn log(&self) -> Vec<(String, Option<String>)> {
            self.log.lock().unwrap().clone()
        }

        pub fn write_attempts(&self) -> usize {
            self.write_attempts.load(Ordering::SeqCst)
        }

        fn check_write(&self) -> Result<(), BackendError> {
            self.write_attempts.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) || self.fail_writes.load(Ordering::SeqCst) {
                return Err(BackendError::Remote("write rejected".to_string()));
            }
            Ok(())
        }

        fn check_read(&self) -> Result<(), BackendError> {
            if self.offline.load(Ordering::SeqCst) || self.fail_reads.load(Ordering::SeqCst) {
                return Err(BackendError::Remote("read rejected".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteBackend for MemoryRemote {
        async fn probe(&self) -> Result<(), BackendError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(BackendError::Unavailable("offline".to_string()));
            }
            Ok(())
        }

        async fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
            let delay = *self.read_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.check_read()?;
            Ok(self.items.lock().unwrap().get(key).cloned())
        }

        async fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
            self.check_write()?;
            self.items
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            self.log
                .lock()
                .unwrap()
                .push((key.to_string(), Some(value.to_string())));
            Ok(())
        }

        async fn remove_item(&self, key: &str) -> Result<(), BackendError> {
            self.check_write()?;
            self.items.lock().unwrap().remove(key);
            self.log.lock().unwrap().push((key.to_string(), None));
            Ok(())
        }

        async fn keys(&self) -> Result<Vec<String>, BackendError> {
            self.check_read()?;
            Ok(self.items.lock().unwrap().keys().cloned().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get_item("k").unwrap(), None);

        backend.set_item("k", "1").unwrap();
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("1"));
        assert_eq!(backend.keys().unwrap(), vec!["k".to_string()]);

        backend.remove_item("k").unwrap();
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn test_memory_backend_quota() {
        let backend = MemoryBackend::with_quota(4);
        backend.set_item("a", "1234").unwrap();
        assert!(matches!(
            backend.set_item("b", "5"),
            Err(BackendError::QuotaExceeded { needed: 5, quota: 4 })
        ));
        backend.set_item("a", "12").unwrap();
        backend.set_item("b", "34").unwrap();
    }
}
