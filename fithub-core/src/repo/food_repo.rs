//! Daily food log.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::error::RepositoryError;
use crate::models::{food_log_key, DayLog, FoodItem, FoodLog, MealType};
use crate::storage::{StorageKey, Store};

/// Calories per meal and in total for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub meals: Vec<(MealType, u32)>,
    pub total: u32,
    pub goal: u32,
    /// Negative once the goal is exceeded.
    pub remaining: i64,
}

#[derive(Debug, Clone)]
pub struct FoodRepository {
    store: Store,
}

impl FoodRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn log(&self) -> Result<FoodLog, RepositoryError> {
        Ok(self.store.get_as(StorageKey::FoodLog.as_str()).await?)
    }

    pub async fn day(&self, date: NaiveDate) -> Result<DayLog, RepositoryError> {
        Ok(self
            .log()
            .await?
            .remove(&food_log_key(date))
            .unwrap_or_default())
    }

    pub async fn add_item(
        &self,
        date: NaiveDate,
        meal: MealType,
        item: FoodItem,
    ) -> Result<FoodItem, RepositoryError> {
        let mut log = self.log().await?;
        log.entry(food_log_key(date))
            .or_default()
            .meal_mut(meal)
            .push(item.clone());

        self.store
            .set_as(StorageKey::FoodLog.as_str(), &log)
            .await?;
        Ok(item)
    }

    /// Removes an item. Days left without any food are dropped from the log.
    pub async fn remove_item(
        &self,
        date: NaiveDate,
        meal: MealType,
        id: Uuid,
    ) -> Result<FoodItem, RepositoryError> {
        let key = food_log_key(date);
        let mut log = self.log().await?;

        let day = log
            .get_mut(&key)
            .ok_or_else(|| RepositoryError::NotFound(format!("no food logged on {}", key)))?;
        let items = day.meal_mut(meal);
        let index = items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| RepositoryError::NotFound(format!("food item {}", id)))?;
        let removed = items.remove(index);

        if day.is_empty() {
            log.remove(&key);
        }

        self.store
            .set_as(StorageKey::FoodLog.as_str(), &log)
            .await?;
        Ok(removed)
    }

    pub async fn day_summary(
        &self,
        date: NaiveDate,
        goal: u32,
    ) -> Result<DaySummary, RepositoryError> {
        let day = self.day(date).await?;
        let meals = MealType::ALL
            .iter()
            .map(|m| (*m, day.meal_calories(*m)))
            .collect();
        let total = day.total_calories();

        Ok(DaySummary {
            date,
            meals,
            total,
            goal,
            remaining: i64::from(goal) - i64::from(total),
        })
    }
}
