//! Fithub Core Library
//!
//! Workout and food models, the local-first key-value store with remote
//! mirroring, and statistics over saved workouts.

pub mod models;
pub mod repo;
pub mod stats;
pub mod storage;

pub use models::{
    food_log_key, DayLog, Exercise, FoodItem, FoodLog, MealType, Set, Settings, SingleExercise,
    Superset, UserData, Workout,
};
pub use repo::{DaySummary, FoodRepository, RepositoryError, SettingsRepository, WorkoutRepository};
pub use storage::{
    BackendError, Backends, DrainReport, FileBackend, HttpRemote, LocalBackend, MemoryBackend,
    RemoteBackend, Snapshot, StorageInfo, StorageKey, StorageMode, Store, StoreConfig, StoreError,
    StoreEvent, SyncStatus,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "1.0.0");
    }
}
