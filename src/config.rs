//! CLI settings, layered as defaults, then the YAML file, then `FIT_*` variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fithub_core::storage::{DEFAULT_AUTO_SAVE_INTERVAL, DEFAULT_INIT_TIMEOUT, MAX_STORAGE_SIZE};
use fithub_core::StoreConfig;

const APP_DIR: &str = "fithub";
const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConfigSource::Default => "default",
            ConfigSource::File => "file",
            ConfigSource::Environment => "environment",
        };
        f.write_str(name)
    }
}

/// A setting plus the layer it came from, shown by `fit config show`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    fn default_value(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
        }
    }

    fn set(&mut self, value: T, source: ConfigSource) {
        self.value = value;
        self.source = source;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub server_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub init_timeout_ms: u64,
    /// 0 disables periodic re-sends.
    pub auto_save_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_key: None,
            init_timeout_ms: DEFAULT_INIT_TIMEOUT.as_millis() as u64,
            auto_save_secs: DEFAULT_AUTO_SAVE_INTERVAL.as_secs(),
        }
    }
}

impl SyncConfig {
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some() && self.api_key.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub data_dir: ConfigValue<PathBuf>,
    pub max_storage_bytes: ConfigValue<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub sync: SyncConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileLayer {
    data_dir: Option<PathBuf>,
    max_storage_bytes: Option<usize>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Reads `config_path` (or the default path) if it exists, then the process environment.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path.unwrap_or_else(Self::default_config_path);
        let file = if path.exists() {
            Some((read_file_layer(&path)?, path))
        } else {
            None
        };
        Self::from_layers(file, |name| std::env::var(name).ok())
    }

    fn from_layers(
        file: Option<(FileLayer, PathBuf)>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self {
            data_dir: ConfigValue::default_value(Self::default_data_dir()),
            max_storage_bytes: ConfigValue::default_value(MAX_STORAGE_SIZE),
            config_file: None,
            sync: SyncConfig::default(),
        };

        if let Some((layer, path)) = file {
            if let Some(dir) = layer.data_dir {
                let dir = match path.parent() {
                    Some(base) if dir.is_relative() => base.join(dir),
                    _ => dir,
                };
                config.data_dir.set(dir, ConfigSource::File);
            }
            if let Some(bytes) = layer.max_storage_bytes {
                config.max_storage_bytes.set(bytes, ConfigSource::File);
            }
            if let Some(sync) = layer.sync {
                config.sync = sync;
            }
            config.config_file = Some(path);
        }

        if let Some(dir) = env("FIT_DATA_DIR") {
            config
                .data_dir
                .set(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Some(raw) = env("FIT_MAX_STORAGE_BYTES") {
            let bytes = raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("FIT_MAX_STORAGE_BYTES", raw))?;
            config
                .max_storage_bytes
                .set(bytes, ConfigSource::Environment);
        }
        if let Some(url) = env("FIT_SYNC_URL") {
            config.sync.server_url = Some(url);
        }
        if let Some(key) = env("FIT_SYNC_API_KEY") {
            config.sync.api_key = Some(key);
        }

        Ok(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_size: self.max_storage_bytes.value,
            init_timeout: Duration::from_millis(self.sync.init_timeout_ms),
            ..StoreConfig::default()
        }
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILE_NAME)
    }

    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

fn read_file_layer(path: &Path) -> Result<FileLayer, ConfigError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

#[derive(Debug)]
pub enum ConfigError {
    Read(PathBuf, std::io::Error),
    Parse(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::Parse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
