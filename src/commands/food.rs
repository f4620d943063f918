use clap::{Args, Subcommand};
use uuid::Uuid;

use fithub_core::{FoodItem, FoodRepository, MealType, SettingsRepository};

use super::{parse_date_or_today, OutputFormat};

#[derive(Args)]
pub struct FoodCommand {
    #[command(subcommand)]
    pub command: FoodSubcommand,
}

#[derive(Subcommand)]
pub enum FoodSubcommand {
    /// Log a food portion
    Add {
        /// Food name
        name: String,

        /// Portion weight in grams
        #[arg(long, short)]
        weight: f64,

        /// Calories per 100 g
        #[arg(long, short)]
        calories: f64,

        /// Meal (breakfast, lunch, dinner, snack)
        #[arg(long, short, default_value = "snack")]
        meal: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Remove a logged food portion
    Remove {
        /// Food item ID (UUID)
        id: String,

        /// Meal the item was logged under
        #[arg(long, short)]
        meal: String,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Show the food log for a day
    Show {
        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl FoodCommand {
    pub async fn run(
        &self,
        repo: &FoodRepository,
        settings: &SettingsRepository,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            FoodSubcommand::Add {
                name,
                weight,
                calories,
                meal,
                date,
            } => {
                let date = parse_date_or_today(date.as_deref())?;
                let meal: MealType = meal.parse()?;
                let item = FoodItem::new(name, *weight, *calories)?;

                let item = repo.add_item(date, meal, item).await?;
                println!(
                    "Logged {} ({} g, {} kcal) for {} on {}",
                    item.name, item.weight, item.total_calories, meal, date
                );
                println!("Item ID: {}", item.id);
                Ok(())
            }

            FoodSubcommand::Remove { id, meal, date } => {
                let date = parse_date_or_today(date.as_deref())?;
                let meal: MealType = meal.parse()?;
                let id = Uuid::parse_str(id).map_err(|_| format!("Invalid food item UUID: {}", id))?;

                let removed = repo.remove_item(date, meal, id).await?;
                println!("Removed {} from {} on {}", removed.name, meal, date);
                Ok(())
            }

            FoodSubcommand::Show { date, format } => {
                let date = parse_date_or_today(date.as_deref())?;
                let goal = settings.settings().await?.daily_calorie_goal;
                let day = repo.day(date).await?;
                let summary = repo.day_summary(date, goal).await?;

                match format {
                    OutputFormat::Json => {
                        let value = serde_json::json!({
                            "log": day,
                            "summary": summary,
                        });
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    }
                    OutputFormat::Text => {
                        println!("Food log: {}", date);
                        println!("{}", "=".repeat(30));

                        for meal in MealType::ALL {
                            let items = day.meal(meal);
                            println!("\n{} ({} kcal)", meal, day.meal_calories(meal));
                            if items.is_empty() {
                                println!("  -");
                            }
                            for item in items {
                                println!(
                                    "  {:<20} {:>6} g {:>6} kcal  {}",
                                    item.name, item.weight, item.total_calories, item.id
                                );
                            }
                        }

                        println!();
                        println!("Total: {} / {} kcal", summary.total, summary.goal);
                        if summary.remaining >= 0 {
                            println!("Remaining: {} kcal", summary.remaining);
                        } else {
                            println!("Over goal by {} kcal", -summary.remaining);
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
