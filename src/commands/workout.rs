use chrono::{Duration, Local};
use clap::{Args, Subcommand};

use fithub_core::stats::workout_totals;
use fithub_core::WorkoutRepository;

use super::{format_weight, parse_date, OutputFormat};

#[derive(Args)]
pub struct WorkoutCommand {
    #[command(subcommand)]
    pub command: WorkoutSubcommand,
}

#[derive(Subcommand)]
pub enum WorkoutSubcommand {
    /// List saved workouts, newest first
    List {
        /// Start date (YYYY-MM-DD), defaults to 30 days ago
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        to: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the workout saved for a date
    Show {
        /// Date (YYYY-MM-DD)
        date: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete the workout saved for a date
    Delete {
        /// Date (YYYY-MM-DD)
        date: String,
    },
}

impl WorkoutCommand {
    pub async fn run(&self, repo: &WorkoutRepository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            WorkoutSubcommand::List { from, to, format } => {
                let to_date = match to {
                    Some(d) => parse_date(d)?,
                    None => Local::now().date_naive(),
                };
                let from_date = match from {
                    Some(d) => parse_date(d)?,
                    None => to_date - Duration::days(30),
                };

                let workouts = repo.list_range(from_date, to_date).await?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&workouts)?);
                    }
                    OutputFormat::Text => {
                        if workouts.is_empty() {
                            println!("No workouts found for {} to {}", from_date, to_date);
                            return Ok(());
                        }

                        println!(
                            "{:<12} {:>9} {:>6} {:>6} {:>12}",
                            "DATE", "EXERCISES", "SETS", "REPS", "TONNAGE"
                        );
                        println!("{}", "-".repeat(49));
                        for workout in &workouts {
                            let totals = workout_totals(workout);
                            println!(
                                "{:<12} {:>9} {:>6} {:>6} {:>12}",
                                workout.date.to_string(),
                                workout.exercises.len(),
                                totals.sets,
                                totals.reps,
                                format_weight(totals.tonnage)
                            );
                        }
                        println!("\nTotal: {} workout(s)", workouts.len());
                    }
                }
                Ok(())
            }

            WorkoutSubcommand::Show { date, format } => {
                let date = parse_date(date)?;
                let workout = repo
                    .get_by_date(date)
                    .await?
                    .ok_or_else(|| format!("No workout saved for {}", date))?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&workout)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", workout);
                        let totals = workout_totals(&workout);
                        println!();
                        println!(
                            "Tonnage: {}  Reps: {}  Sets: {}  Max weight: {}",
                            format_weight(totals.tonnage),
                            totals.reps,
                            totals.sets,
                            format_weight(totals.max_weight)
                        );
                    }
                }
                Ok(())
            }

            WorkoutSubcommand::Delete { date } => {
                let date = parse_date(date)?;
                if repo.delete(date).await? {
                    println!("Deleted workout for {}", date);
                    Ok(())
                } else {
                    Err(format!("No workout saved for {}", date).into())
                }
            }
        }
    }
}
