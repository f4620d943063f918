//! Local-first key-value storage.
//!
//! The local backend is authoritative; a remote, when available at
//! construction, receives the same writes in order through a queue.

mod backend;
mod error;
mod file;
mod http;
mod keys;
mod memory;
mod queue;
mod snapshot;
mod store;

pub use backend::{Backends, LocalBackend, RemoteBackend, StorageMode};
pub use error::{BackendError, StoreError};
pub use file::{validate_key, FileBackend, DEFAULT_LOCAL_QUOTA};
pub use http::{HttpRemote, KeysBody, ValueBody};
pub use keys::{default_for, StorageKey};
pub use memory::MemoryBackend;
pub use queue::{DrainReport, QueueEntry, SyncStatus};
pub use snapshot::{Snapshot, StorageInfo};
pub use store::{
    Store, StoreConfig, StoreEvent, DATA_VERSION, DEFAULT_AUTO_SAVE_INTERVAL,
    DEFAULT_INIT_TIMEOUT, DEFAULT_SHUTDOWN_TIMEOUT, MAX_STORAGE_SIZE,
};

