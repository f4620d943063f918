//! Server-side key-value storage.
//!
//! Values are stored per user as JSON text files:
//! ```text
//! <DATA_DIR>/
//!   <user_id>/
//!     workouts.json
//!     settings.json
//!     ...
//! ```

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;

use fithub_core::storage::validate_key;

const EXTENSION: &str = "json";

/// Errors that can occur during server storage operations.
#[derive(Debug)]
pub enum ServerStorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// Invalid user ID (e.g., contains path separators).
    InvalidUserId(String),
    /// Invalid key.
    InvalidKey(String),
}

impl std::fmt::Display for ServerStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            ServerStorageError::InvalidUserId(id) => write!(f, "Invalid user ID: {}", id),
            ServerStorageError::InvalidKey(key) => write!(f, "Invalid key: {}", key),
        }
    }
}

impl std::error::Error for ServerStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerStorageError::IoError(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Checks a path component so it cannot escape its directory.
fn is_safe_component(s: &str) -> bool {
    !(s.is_empty()
        || s.contains('/')
        || s.contains('\\')
        || s.contains("..")
        || s.starts_with('.'))
}

/// Per-user key-value storage on disk.
#[derive(Debug, Clone)]
pub struct ServerStorage {
    data_dir: PathBuf,
}

impl ServerStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn validate(user_id: &str, key: Option<&str>) -> Result<(), ServerStorageError> {
        if !is_safe_component(user_id) {
            return Err(ServerStorageError::InvalidUserId(user_id.to_string()));
        }
        if let Some(key) = key {
            if validate_key(key).is_err() {
                return Err(ServerStorageError::InvalidKey(key.to_string()));
            }
        }
        Ok(())
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.data_dir.join(user_id)
    }

    fn value_path(&self, user_id: &str, key: &str) -> PathBuf {
        self.user_dir(user_id).join(format!("{}.{}", key, EXTENSION))
    }

    /// Loads a value. Returns `Ok(None)` if the key was never written.
    pub fn load(&self, user_id: &str, key: &str) -> Result<Option<String>, ServerStorageError> {
        Self::validate(user_id, Some(key))?;

        let path = self.value_path(user_id, key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ServerStorageError::IoError(path, e)),
        }
    }

    /// Saves a value, creating the user directory if needed.
    pub fn save(&self, user_id: &str, key: &str, value: &str) -> Result<(), ServerStorageError> {
        Self::validate(user_id, Some(key))?;

        let user_dir = self.user_dir(user_id);
        let path = self.value_path(user_id, key);

        fs::create_dir_all(&user_dir)
            .map_err(|e| ServerStorageError::IoError(user_dir.clone(), e))?;

        // Write atomically using temp file + rename
        let temp_path = path.with_extension("json.tmp");

        let mut file = File::create(&temp_path)
            .map_err(|e| ServerStorageError::IoError(temp_path.clone(), e))?;
        file.write_all(value.as_bytes())
            .map_err(|e| ServerStorageError::IoError(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| ServerStorageError::IoError(temp_path.clone(), e))?;

        fs::rename(&temp_path, &path).map_err(|e| ServerStorageError::IoError(path, e))?;

        Ok(())
    }

    /// Deletes a value. Returns whether it existed.
    pub fn delete(&self, user_id: &str, key: &str) -> Result<bool, ServerStorageError> {
        Self::validate(user_id, Some(key))?;

        let path = self.value_path(user_id, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ServerStorageError::IoError(path, e)),
        }
    }

    /// Lists a user's keys, sorted.
    pub fn list_keys(&self, user_id: &str) -> Result<Vec<String>, ServerStorageError> {
        Self::validate(user_id, None)?;

        let dir = self.user_dir(user_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ServerStorageError::IoError(dir, e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ServerStorageError::IoError(dir.clone(), e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
