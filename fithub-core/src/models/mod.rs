mod food;
mod meal_type;
mod profile;
mod workout;

pub use food::{food_log_key, DayLog, FoodItem, FoodLog};
pub use meal_type::MealType;
pub use profile::{Settings, UserData};
pub use workout::{Exercise, Set, SingleExercise, Superset, Workout};
