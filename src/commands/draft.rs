//! Build today's workout before saving it.

use chrono::NaiveDate;
use clap::{Args, Subcommand};

use fithub_core::stats::workout_totals;
use fithub_core::{Exercise, Set, SingleExercise, Superset, Workout, WorkoutRepository};

use super::{format_weight, parse_date_or_today, OutputFormat};

const FREQUENT_LIMIT: usize = 5;

#[derive(Args)]
pub struct DraftCommand {
    #[command(subcommand)]
    pub command: DraftSubcommand,
}

#[derive(Subcommand)]
pub enum DraftSubcommand {
    /// Add an exercise to the draft
    Add {
        /// Exercise name
        name: String,

        /// Sets as WEIGHTxREPS (e.g., 60x10 62.5x8)
        sets: Vec<String>,

        /// Reuse the sets from the last time this exercise was saved
        #[arg(long, conflicts_with = "sets")]
        repeat: bool,

        /// Workout date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Add a superset (two or more exercises performed back to back)
    Superset {
        /// Exercise as NAME=WEIGHTxREPS,WEIGHTxREPS (repeat for each exercise)
        #[arg(long = "exercise", short = 'e', value_name = "EXERCISE", required = true)]
        exercises: Vec<String>,

        /// Workout date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Remove an exercise from the draft by its number
    Remove {
        /// Exercise number as shown by `fit draft show`
        number: usize,

        /// Workout date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Show the draft
    Show {
        /// Workout date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Save the draft as a finished workout
    Save {
        /// Workout date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Throw the draft away
    Discard,
}

impl DraftCommand {
    pub async fn run(&self, repo: &WorkoutRepository) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DraftSubcommand::Add {
                name,
                sets,
                repeat,
                date,
            } => {
                let date = parse_date_or_today(date.as_deref())?;
                let sets = if *repeat {
                    repo.last_sets_for(name)
                        .await?
                        .ok_or_else(|| format!("No saved sets found for '{}'", name))?
                } else {
                    parse_sets(sets)?
                };

                let mut draft = self.draft_for(repo, date).await?;
                draft.add_exercise(SingleExercise::new(name.trim()).with_sets(sets));
                repo.save_draft(&draft).await?;

                println!("Added '{}' to the draft for {}", name.trim(), date);
                Ok(())
            }

            DraftSubcommand::Superset { exercises, date } => {
                let date = parse_date_or_today(date.as_deref())?;
                let singles = exercises
                    .iter()
                    .map(|e| parse_exercise(e))
                    .collect::<Result<Vec<_>, _>>()?;
                let superset = Superset::new(singles)?;

                let mut draft = self.draft_for(repo, date).await?;
                let label = Exercise::from(superset.clone()).name();
                draft.add_exercise(superset);
                repo.save_draft(&draft).await?;

                println!("Added superset '{}' to the draft for {}", label, date);
                Ok(())
            }

            DraftSubcommand::Remove { number, date } => {
                let date = parse_date_or_today(date.as_deref())?;
                let mut draft = repo
                    .load_draft(date)
                    .await?
                    .ok_or_else(|| format!("No draft for {}", date))?;

                let removed = number
                    .checked_sub(1)
                    .and_then(|i| draft.remove_exercise(i))
                    .ok_or_else(|| format!("No exercise number {} in the draft", number))?;
                repo.save_draft(&draft).await?;

                println!("Removed '{}' from the draft", removed.name());
                Ok(())
            }

            DraftSubcommand::Show { date, format } => {
                let date = parse_date_or_today(date.as_deref())?;
                let Some(draft) = repo.load_draft(date).await? else {
                    println!("No draft for {}", date);
                    let frequent = repo.frequent_exercises(FREQUENT_LIMIT).await?;
                    if !frequent.is_empty() {
                        println!("Frequent exercises: {}", frequent.join(", "));
                    }
                    return Ok(());
                };

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&draft)?),
                    OutputFormat::Text => {
                        print!("{}", draft);
                        let totals = workout_totals(&draft);
                        println!();
                        println!(
                            "Tonnage: {}  Reps: {}  Sets: {}",
                            format_weight(totals.tonnage),
                            totals.reps,
                            totals.sets
                        );
                    }
                }
                Ok(())
            }

            DraftSubcommand::Save { date } => {
                let date = parse_date_or_today(date.as_deref())?;
                let draft = repo
                    .load_draft(date)
                    .await?
                    .ok_or_else(|| format!("No draft for {}", date))?;

                let replaced = repo.get_by_date(date).await?.is_some();
                let saved = repo.save(&draft).await?;
                let totals = workout_totals(&saved);

                if replaced {
                    println!("Replaced workout for {}", saved.date);
                } else {
                    println!("Saved workout for {}", saved.date);
                }
                println!(
                    "  {} exercise(s), {} set(s), {}",
                    saved.exercises.len(),
                    totals.sets,
                    format_weight(totals.tonnage)
                );
                Ok(())
            }

            DraftSubcommand::Discard => {
                repo.discard_draft().await?;
                println!("Draft discarded");
                Ok(())
            }
        }
    }

    /// The draft for `date`, or a fresh one (replacing a draft from another day).
    async fn draft_for(
        &self,
        repo: &WorkoutRepository,
        date: NaiveDate,
    ) -> Result<Workout, Box<dyn std::error::Error>> {
        match repo.load_draft(date).await? {
            Some(draft) => Ok(draft),
            None => {
                let mut draft = Workout::new(date);
                draft.start();
                Ok(draft)
            }
        }
    }
}

fn parse_sets(sets: &[String]) -> Result<Vec<Set>, String> {
    sets.iter().map(|s| s.parse()).collect()
}

/// Parses `NAME=60x10,60x8`.
fn parse_exercise(input: &str) -> Result<SingleExercise, String> {
    let (name, sets) = input
        .split_once('=')
        .ok_or_else(|| format!("Invalid exercise '{}'. Use NAME=WEIGHTxREPS,...", input))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Missing exercise name in '{}'", input));
    }

    let sets = sets
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<Set>, String>>()?;

    Ok(SingleExercise::new(name).with_sets(sets))
}
