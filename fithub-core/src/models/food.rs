use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::meal_type::MealType;

/// One logged food portion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    /// Portion weight in grams.
    pub weight: f64,
    pub calories_per100g: f64,
    pub total_calories: u32,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl FoodItem {
    /// Creates a food item, computing total calories from the portion weight.
    pub fn new(name: impl Into<String>, weight: f64, calories_per100g: f64) -> Result<Self, String> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err("Food name must not be empty".to_string());
        }
        if weight <= 0.0 || !weight.is_finite() {
            return Err(format!("Weight must be positive, got {}", weight));
        }
        if calories_per100g <= 0.0 || !calories_per100g.is_finite() {
            return Err(format!(
                "Calories per 100g must be positive, got {}",
                calories_per100g
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            weight,
            calories_per100g,
            total_calories: (calories_per100g * weight / 100.0).round() as u32,
            timestamp: Utc::now(),
        })
    }
}

/// Food eaten on one day, grouped by meal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayLog {
    #[serde(default)]
    pub breakfast: Vec<FoodItem>,
    #[serde(default)]
    pub lunch: Vec<FoodItem>,
    #[serde(default)]
    pub dinner: Vec<FoodItem>,
    #[serde(default)]
    pub snack: Vec<FoodItem>,
}

impl DayLog {
    pub fn meal(&self, meal: MealType) -> &[FoodItem] {
        match meal {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Dinner => &self.dinner,
            MealType::Snack => &self.snack,
        }
    }

    pub fn meal_mut(&mut self, meal: MealType) -> &mut Vec<FoodItem> {
        match meal {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
            MealType::Snack => &mut self.snack,
        }
    }

    pub fn meal_calories(&self, meal: MealType) -> u32 {
        self.meal(meal).iter().map(|i| i.total_calories).sum()
    }

    pub fn total_calories(&self) -> u32 {
        MealType::ALL.iter().map(|m| self.meal_calories(*m)).sum()
    }

    pub fn is_empty(&self) -> bool {
        MealType::ALL.iter().all(|m| self.meal(*m).is_empty())
    }
}

/// The whole food diary, keyed by `YYYY-MM-DD`.
pub type FoodLog = BTreeMap<String, DayLog>;

/// Key used for a date in the food log.
pub fn food_log_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_item_calories() {
        let item = FoodItem::new("Oats", 80.0, 370.0).unwrap();
        assert_eq!(item.total_calories, 296);

        let item = FoodItem::new("Apple", 150.0, 52.0).unwrap();
        assert_eq!(item.total_calories, 78);
    }

    #[test]
    fn test_food_item_validation() {
        assert!(FoodItem::new("  ", 100.0, 100.0).is_err());
        assert!(FoodItem::new("Rice", 0.0, 100.0).is_err());
        assert!(FoodItem::new("Rice", 100.0, -1.0).is_err());
        assert!(FoodItem::new("Rice", f64::NAN, 100.0).is_err());
    }

    #[test]
    fn test_day_log_totals() {
        let mut day = DayLog::default();
        assert!(day.is_empty());

        day.meal_mut(MealType::Lunch)
            .push(FoodItem::new("Rice", 200.0, 130.0).unwrap());
        day.meal_mut(MealType::Snack)
            .push(FoodItem::new("Nuts", 30.0, 600.0).unwrap());

        assert_eq!(day.meal_calories(MealType::Lunch), 260);
        assert_eq!(day.total_calories(), 440);
        assert!(!day.is_empty());
    }

    #[test]
    fn test_food_item_json_field_names() {
        let item = FoodItem::new("Oats", 80.0, 370.0).unwrap();
        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("caloriesPer100g").is_some());
        assert!(value.get("totalCalories").is_some());
    }

    #[test]
    fn test_food_log_key() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(food_log_key(date), "2024-03-05");
    }
}
