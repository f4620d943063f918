//! Keys the application stores records under, and their defaults.

use serde_json::{json, Value};
use std::fmt;

use crate::models::{Settings, UserData};

/// A key with a documented default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Ordered sequence of saved workouts.
    Workouts,
    /// At most one in-progress workout, or null.
    DraftWorkout,
    Settings,
    /// Lifetime aggregate counters.
    UserData,
    /// Mapping from date string to per-meal sequences.
    FoodLog,
}

impl StorageKey {
    pub const ALL: [StorageKey; 5] = [
        StorageKey::Workouts,
        StorageKey::DraftWorkout,
        StorageKey::Settings,
        StorageKey::UserData,
        StorageKey::FoodLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Workouts => "workouts",
            StorageKey::DraftWorkout => "draftWorkout",
            StorageKey::Settings => "settings",
            StorageKey::UserData => "userData",
            StorageKey::FoodLog => "food_log",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        StorageKey::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Value returned for this key when nothing (or null) is stored.
    pub fn default_value(&self) -> Value {
        match self {
            StorageKey::Workouts => json!([]),
            StorageKey::DraftWorkout => Value::Null,
            StorageKey::Settings => {
                serde_json::to_value(Settings::default()).unwrap_or(Value::Null)
            }
            StorageKey::UserData => serde_json::to_value(UserData::new()).unwrap_or(Value::Null),
            StorageKey::FoodLog => json!({}),
        }
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default for any key; keys outside [`StorageKey::ALL`] default to null.
pub fn default_for(key: &str) -> Value {
    StorageKey::parse(key)
        .map(|k| k.default_value())
        .unwrap_or(Value::Null)
}
