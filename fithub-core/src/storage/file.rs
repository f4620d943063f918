//! File-backed local storage.
//!
//! Each key is stored as one JSON text file:
//! ```text
//! <DATA_DIR>/
//!   workouts.json
//!   draftWorkout.json
//!   settings.json
//!   ...
//! ```

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::backend::LocalBackend;
use super::error::BackendError;

/// Default ceiling on the total size of all stored files.
pub const DEFAULT_LOCAL_QUOTA: u64 = 5 * 1024 * 1024;

const EXTENSION: &str = "json";

/// Accepts keys made of ASCII letters, digits, `_` and `-`.
///
/// Keys become file names here and path segments on the server, so nothing
/// that needs escaping in either place is allowed.
pub fn validate_key(key: &str) -> Result<(), BackendError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(BackendError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Local backend writing one file per key.
#[derive(Debug, Clone)]
pub struct FileBackend {
    data_dir: PathBuf,
    quota: u64,
}

impl FileBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            quota: DEFAULT_LOCAL_QUOTA,
        }
    }

    pub fn with_quota(mut self, quota: u64) -> Self {
        self.quota = quota;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.{}", key, EXTENSION))
    }

    /// Total bytes on disk for every key except `skip`.
    fn used_bytes_except(&self, skip: &str) -> Result<u64, BackendError> {
        let mut total = 0;
        for key in self.keys()? {
            if key == skip {
                continue;
            }
            let path = self.key_path(&key);
            match fs::metadata(&path) {
                Ok(meta) => total += meta.len(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(BackendError::Io(path, e)),
            }
        }
        Ok(total)
    }
}

impl LocalBackend for FileBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        validate_key(key)?;
        let path = self.key_path(key);

        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackendError::Io(path, e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        validate_key(key)?;

        let needed = self.used_bytes_except(key)? + value.len() as u64;
        if needed > self.quota {
            return Err(BackendError::QuotaExceeded {
                needed,
                quota: self.quota,
            });
        }

        fs::create_dir_all(&self.data_dir)
            .map_err(|e| BackendError::Io(self.data_dir.clone(), e))?;

        let path = self.key_path(key);
        let temp_path = path.with_extension("json.tmp");

        let mut file =
            File::create(&temp_path).map_err(|e| BackendError::Io(temp_path.clone(), e))?;
        file.write_all(value.as_bytes())
            .map_err(|e| BackendError::Io(temp_path.clone(), e))?;
        file.sync_all()
            .map_err(|e| BackendError::Io(temp_path.clone(), e))?;

        fs::rename(&temp_path, &path).map_err(|e| BackendError::Io(path, e))?;

        debug!("Wrote {} bytes for key {}", value.len(), key);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        validate_key(key)?;
        let path = self.key_path(key);

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::Io(path, e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BackendError::Io(self.data_dir.clone(), e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BackendError::Io(self.data_dir.clone(), e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (FileBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("data"));
        (backend, temp_dir)
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("workouts").is_ok());
        assert!(validate_key("food_log").is_ok());
        assert!(validate_key("draftWorkout").is_ok());

        assert!(validate_key("").is_err());
        assert!(validate_key("../evil").is_err());
        assert!(validate_key("foo/bar").is_err());
        assert!(validate_key("foo\\bar").is_err());
        assert!(validate_key(".hidden").is_err());
    }

    #[test]
    fn test_validate_key_rejects_url_characters() {
        assert!(validate_key("my-key_2").is_ok());

        for key in ["a?b=1", "a#frag", "two words", "caf\u{e9}", "100%"] {
            assert!(
                matches!(validate_key(key), Err(BackendError::InvalidKey(_))),
                "{} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (backend, _temp) = setup();
        assert_eq!(backend.get_item("workouts").unwrap(), None);
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn test_set_get_remove() {
        let (backend, _temp) = setup();

        backend.set_item("settings", r#"{"theme":"light"}"#).unwrap();
        assert_eq!(
            backend.get_item("settings").unwrap().as_deref(),
            Some(r#"{"theme":"light"}"#)
        );
        assert_eq!(backend.keys().unwrap(), vec!["settings".to_string()]);

        backend.remove_item("settings").unwrap();
        assert_eq!(backend.get_item("settings").unwrap(), None);

        // Removing again is not an error
        backend.remove_item("settings").unwrap();
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (backend, _temp) = setup();
        backend.set_item("workouts", "[]").unwrap();

        let names: Vec<String> = fs::read_dir(backend.data_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["workouts.json".to_string()]);
    }

    #[test]
    fn test_quota_exceeded() {
        let (backend, _temp) = setup();
        let backend = backend.with_quota(10);

        backend.set_item("a", "12345").unwrap();
        // Replacing a key only counts the new value
        backend.set_item("a", "1234567890").unwrap();

        let err = backend.set_item("b", "1").unwrap_err();
        assert!(matches!(
            err,
            BackendError::QuotaExceeded {
                needed: 11,
                quota: 10
            }
        ));
        assert_eq!(backend.get_item("b").unwrap(), None);
    }
}
