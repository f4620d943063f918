use chrono::Local;
use clap::{Args, Subcommand};

use fithub_core::stats::{
    daily_counts, exercise_progress, exercise_summaries, overview, personal_records,
    workouts_this_week, RecordKind,
};
use fithub_core::{SettingsRepository, WorkoutRepository};

use super::{format_weight, OutputFormat};

/// Days shown in the activity strip of the overview.
const ACTIVITY_DAYS: u32 = 14;

#[derive(Args)]
pub struct StatsCommand {
    #[command(subcommand)]
    pub command: Option<StatsSubcommand>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum StatsSubcommand {
    /// Totals, streaks and weekly activity (default)
    Overview,

    /// Personal records across all exercises
    Records,

    /// Totals per exercise
    Exercises,

    /// Progress over time for one exercise
    Exercise {
        /// Exercise name (case-insensitive)
        name: String,
    },
}

impl StatsCommand {
    pub async fn run(
        &self,
        repo: &WorkoutRepository,
        settings: &SettingsRepository,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let workouts = repo.list().await?;
        let today = Local::now().date_naive();

        match self.command.as_ref().unwrap_or(&StatsSubcommand::Overview) {
            StatsSubcommand::Overview => {
                let first_day = settings.settings().await?.first_day_of_week;
                let summary = overview(&workouts, today);
                let this_week = workouts_this_week(&workouts, today, first_day);
                let activity = daily_counts(&workouts, today, ACTIVITY_DAYS);

                match self.format {
                    OutputFormat::Json => {
                        let value = serde_json::json!({
                            "overview": summary,
                            "thisWeek": this_week,
                            "activity": activity
                                .iter()
                                .map(|(date, count)| serde_json::json!({ "date": date, "count": count }))
                                .collect::<Vec<_>>(),
                        });
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    }
                    OutputFormat::Text => {
                        if summary.total_workouts == 0 {
                            println!("No workouts saved yet.");
                            return Ok(());
                        }

                        println!("Overview");
                        println!("========\n");
                        println!("Workouts:         {}", summary.total_workouts);
                        println!("This week:        {}", this_week);
                        println!("Total tonnage:    {}", format_weight(summary.total_tonnage));
                        println!("Average tonnage:  {}", format_weight(summary.average_tonnage));
                        println!("Total sets:       {}", summary.total_sets);
                        println!("Total reps:       {}", summary.total_reps);
                        println!("Exercises:        {}", summary.unique_exercises);
                        if let Some(day) = summary.best_day {
                            println!("Best day:         {}", day);
                        }
                        if let Some(weekday) = summary.most_active_weekday {
                            println!("Most active day:  {}", weekday);
                        }
                        println!(
                            "Streak:           {} (longest {})",
                            summary.current_streak, summary.longest_streak
                        );

                        let strip: String = activity
                            .iter()
                            .map(|(_, count)| if *count > 0 { '#' } else { '.' })
                            .collect();
                        println!("\nLast {} days:     {}", ACTIVITY_DAYS, strip);
                    }
                }
                Ok(())
            }

            StatsSubcommand::Records => {
                let records = personal_records(&workouts);

                match self.format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&records)?);
                    }
                    OutputFormat::Text => {
                        if records.is_empty() {
                            println!("No records yet.");
                            return Ok(());
                        }

                        println!("{:<24} {:<12} {:>12} {:<12}", "EXERCISE", "RECORD", "VALUE", "DATE");
                        println!("{}", "-".repeat(63));
                        for record in &records {
                            let value = match record.kind {
                                RecordKind::MaxReps => format!("{}", record.value as u64),
                                _ => format_weight(record.value),
                            };
                            println!(
                                "{:<24} {:<12} {:>12} {:<12}",
                                truncate(&record.exercise, 24),
                                record.kind.to_string(),
                                value,
                                record.date.to_string()
                            );
                        }
                    }
                }
                Ok(())
            }

            StatsSubcommand::Exercises => {
                let summaries = exercise_summaries(&workouts);

                match self.format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&summaries)?);
                    }
                    OutputFormat::Text => {
                        if summaries.is_empty() {
                            println!("No exercises logged yet.");
                            return Ok(());
                        }

                        println!(
                            "{:<24} {:>6} {:>6} {:>6} {:>10} {:>12}",
                            "EXERCISE", "TIMES", "SETS", "REPS", "MAX", "TONNAGE"
                        );
                        println!("{}", "-".repeat(69));
                        for s in &summaries {
                            println!(
                                "{:<24} {:>6} {:>6} {:>6} {:>10} {:>12}",
                                truncate(&s.name, 24),
                                s.count,
                                s.sets,
                                s.reps,
                                format_weight(s.max_weight),
                                format_weight(s.tonnage)
                            );
                        }
                    }
                }
                Ok(())
            }

            StatsSubcommand::Exercise { name } => {
                let points = exercise_progress(&workouts, name);

                match self.format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&points)?);
                    }
                    OutputFormat::Text => {
                        if points.is_empty() {
                            println!("No workouts found with '{}'", name);
                            return Ok(());
                        }

                        println!("{}", name);
                        println!("{}\n", "=".repeat(name.chars().count()));
                        println!("{:<12} {:>10} {:>12}", "DATE", "MAX", "TONNAGE");
                        println!("{}", "-".repeat(36));
                        for p in &points {
                            println!(
                                "{:<12} {:>10} {:>12}",
                                p.date.to_string(),
                                format_weight(p.max_weight),
                                format_weight(p.tonnage)
                            );
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

/// Truncate a string to a maximum number of characters
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Squat", 24), "Squat");
        assert_eq!(truncate("Romanian Deadlift", 10), "Romania...");
    }
}
