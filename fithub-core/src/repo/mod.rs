//! Typed access to the records kept in the store.

mod error;
mod food_repo;
mod settings_repo;
mod workout_repo;

pub use error::RepositoryError;
pub use food_repo::{DaySummary, FoodRepository};
pub use settings_repo::SettingsRepository;
pub use workout_repo::WorkoutRepository;
