//! Export/import snapshot and storage accounting report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::error::StoreError;
use super::queue::SyncStatus;

/// Storage usage as reported to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    /// Bytes used by every cached value, serialized.
    pub size: usize,
    pub limit: usize,
    /// Percentage of the limit in use, two decimals.
    pub usage: f64,
    pub available: usize,
    pub is_cloud_storage: bool,
    #[serde(default)]
    pub queue_length: usize,
    #[serde(default = "default_sync_status")]
    pub sync_status: SyncStatus,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

fn default_sync_status() -> SyncStatus {
    SyncStatus::Idle
}

impl StorageInfo {
    pub fn new(size: usize, limit: usize) -> Self {
        let usage = if limit == 0 {
            0.0
        } else {
            (size as f64 / limit as f64 * 10_000.0).round() / 100.0
        };

        Self {
            size,
            limit,
            usage,
            available: limit.saturating_sub(size),
            is_cloud_storage: false,
            queue_length: 0,
            sync_status: SyncStatus::Idle,
            last_sync: None,
        }
    }
}

/// Every stored key and its value, plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub data: BTreeMap<String, Value>,
    pub metadata: StorageInfo,
}

impl Snapshot {
    /// Parses an exported document, checking its shape first.
    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| StoreError::InvalidSnapshot(format!("not valid JSON: {}", e)))?;

        if !value.is_object() {
            return Err(StoreError::InvalidSnapshot(
                "expected a JSON object".to_string(),
            ));
        }
        match value.get("data") {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(StoreError::InvalidSnapshot(
                    "'data' must be an object".to_string(),
                ))
            }
            None => {
                return Err(StoreError::InvalidSnapshot(
                    "missing 'data' field".to_string(),
                ))
            }
        }

        serde_json::from_value(value).map_err(|e| StoreError::InvalidSnapshot(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialized bytes the data would occupy once imported.
    pub fn data_size(&self) -> Result<usize, StoreError> {
        let mut total = 0;
        for value in self.data.values() {
            total += serde_json::to_string(value)?.len();
        }
        Ok(total)
    }
}
