//! Saved workouts and the in-progress draft.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use super::error::RepositoryError;
use crate::models::{Set, UserData, Workout};
use crate::stats;
use crate::storage::{StorageKey, Store};

/// Workouts are kept newest first, at most one per date.
#[derive(Debug, Clone)]
pub struct WorkoutRepository {
    store: Store,
}

impl WorkoutRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// All saved workouts, newest first.
    pub async fn list(&self) -> Result<Vec<Workout>, RepositoryError> {
        Ok(self.store.get_as(StorageKey::Workouts.as_str()).await?)
    }

    /// Workouts between `from` and `to` inclusive, newest first.
    pub async fn list_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Workout>, RepositoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|w| w.date >= from && w.date <= to)
            .collect())
    }

    pub async fn get_by_date(&self, date: NaiveDate) -> Result<Option<Workout>, RepositoryError> {
        Ok(self.list().await?.into_iter().find(|w| w.date == date))
    }

    /// Saves a workout, replacing any saved workout on the same date.
    ///
    /// The draft is cleared and the lifetime counters recomputed.
    pub async fn save(&self, workout: &Workout) -> Result<Workout, RepositoryError> {
        if workout.is_empty() {
            return Err(RepositoryError::Validation(
                "Cannot save a workout without exercises".to_string(),
            ));
        }

        let mut workout = workout.clone();
        if workout.end_time.is_none() && workout.start_time.is_some() {
            workout.finish();
        }
        workout.touch();

        let mut workouts = self.list().await?;
        match workouts.iter_mut().find(|w| w.date == workout.date) {
            Some(existing) => {
                debug!("Replacing workout for {}", workout.date);
                workout.created_at = existing.created_at;
                *existing = workout.clone();
            }
            None => workouts.push(workout.clone()),
        }
        workouts.sort_by(|a, b| b.date.cmp(&a.date));

        self.store
            .set_as(StorageKey::Workouts.as_str(), &workouts)
            .await?;
        self.discard_draft().await?;
        self.update_user_data(&workouts).await?;

        Ok(workout)
    }

    /// Deletes the workout on `date`. Returns whether one existed.
    pub async fn delete(&self, date: NaiveDate) -> Result<bool, RepositoryError> {
        let mut workouts = self.list().await?;
        let before = workouts.len();
        workouts.retain(|w| w.date != date);
        if workouts.len() == before {
            return Ok(false);
        }

        self.store
            .set_as(StorageKey::Workouts.as_str(), &workouts)
            .await?;
        self.update_user_data(&workouts).await?;
        Ok(true)
    }

    async fn update_user_data(&self, workouts: &[Workout]) -> Result<(), RepositoryError> {
        let previous: UserData = self.store.get_as(StorageKey::UserData.as_str()).await?;
        let data = stats::user_aggregate(workouts, &previous);
        self.store
            .set_as(StorageKey::UserData.as_str(), &data)
            .await?;
        Ok(())
    }

    /// The stored draft, whatever its date.
    pub async fn current_draft(&self) -> Result<Option<Workout>, RepositoryError> {
        Ok(self
            .store
            .get_as::<Option<Workout>>(StorageKey::DraftWorkout.as_str())
            .await?)
    }

    /// The draft for `date`; a draft left over from another day is ignored.
    pub async fn load_draft(&self, date: NaiveDate) -> Result<Option<Workout>, RepositoryError> {
        Ok(self.current_draft().await?.filter(|w| w.date == date))
    }

    pub async fn save_draft(&self, draft: &Workout) -> Result<(), RepositoryError> {
        self.store
            .set_as(StorageKey::DraftWorkout.as_str(), draft)
            .await?;
        Ok(())
    }

    pub async fn discard_draft(&self) -> Result<(), RepositoryError> {
        self.store
            .set(StorageKey::DraftWorkout.as_str(), Value::Null)
            .await?;
        Ok(())
    }

    /// Sets from the most recent saved workout containing `exercise`.
    pub async fn last_sets_for(&self, exercise: &str) -> Result<Option<Vec<Set>>, RepositoryError> {
        let name = exercise.trim().to_lowercase();
        let workouts = self.list().await?;

        for workout in &workouts {
            for entry in &workout.exercises {
                if let Some(single) = entry
                    .singles()
                    .iter()
                    .find(|e| e.name.trim().to_lowercase() == name)
                {
                    return Ok(Some(single.sets.clone()));
                }
            }
        }
        Ok(None)
    }

    /// Names of the most frequently logged exercises.
    pub async fn frequent_exercises(&self, limit: usize) -> Result<Vec<String>, RepositoryError> {
        let workouts = self.list().await?;
        Ok(stats::exercise_summaries(&workouts)
            .into_iter()
            .take(limit)
            .map(|s| s.name)
            .collect())
    }
}
