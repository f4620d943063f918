use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User preferences stored under the `settings` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: String,
    pub haptic_feedback: bool,
    pub auto_save: bool,
    pub sound_effects: bool,
    pub default_weight_unit: String,
    /// 0 = Sunday, 1 = Monday, ...
    pub first_day_of_week: u8,
    pub notifications: bool,
    pub daily_calorie_goal: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            haptic_feedback: true,
            auto_save: true,
            sound_effects: false,
            default_weight_unit: "kg".to_string(),
            first_day_of_week: 1,
            notifications: true,
            daily_calorie_goal: 2000,
        }
    }
}

/// Lifetime counters stored under the `userData` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_workouts: u64,
    #[serde(default)]
    pub total_sets: u64,
    #[serde(default)]
    pub total_reps: u64,
    /// Lifetime tonnage in kg.
    #[serde(default)]
    pub total_weight: f64,
    #[serde(default)]
    pub has_seen_welcome: bool,
}

impl UserData {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            updated_at: None,
            total_workouts: 0,
            total_sets: 0,
            total_reps: 0,
            total_weight: 0.0,
            has_seen_welcome: false,
        }
    }
}

impl Default for UserData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_settings_defaults_fill_missing_fields() {
        let settings: Settings = serde_json::from_value(json!({"theme": "light"})).unwrap();
        assert_eq!(settings.theme, "light");
        assert_eq!(settings.first_day_of_week, 1);
        assert_eq!(settings.daily_calorie_goal, 2000);
        assert!(settings.auto_save);
    }

    #[test]
    fn test_user_data_fresh_counters() {
        let data = UserData::new();
        assert_eq!(data.total_workouts, 0);
        assert_eq!(data.total_weight, 0.0);
        assert!(!data.has_seen_welcome);

        let value = serde_json::to_value(&data).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_none());
    }
}
