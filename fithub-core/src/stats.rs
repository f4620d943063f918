//! Statistics derived from saved workouts.
//!
//! Everything here is a pure function of the workouts passed in; supersets
//! are flattened so each sub-exercise counts on its own.

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{SingleExercise, UserData, Workout};

/// Number of records kept by [`personal_records`].
pub const MAX_RECORDS: usize = 10;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn exercise_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn singles(workout: &Workout) -> impl Iterator<Item = &SingleExercise> {
    workout.exercises.iter().flat_map(|e| e.singles().iter())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutTotals {
    /// Sum of weight x reps, in kg.
    pub tonnage: f64,
    pub reps: u64,
    pub sets: usize,
    pub max_weight: f64,
}

pub fn workout_totals(workout: &Workout) -> WorkoutTotals {
    let mut totals = WorkoutTotals::default();
    for exercise in singles(workout) {
        totals.tonnage += exercise.tonnage();
        totals.reps += exercise.total_reps();
        totals.sets += exercise.sets.len();
        totals.max_weight = totals.max_weight.max(exercise.max_weight());
    }
    totals.tonnage = round2(totals.tonnage);
    totals
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

/// Runs of workouts on consecutive calendar days.
///
/// Several workouts on one date count once. The current streak is the run
/// ending at the latest workout, and only while that workout is from today
/// or yesterday.
pub fn streaks(workouts: &[Workout], today: NaiveDate) -> Streaks {
    let mut dates: Vec<NaiveDate> = workouts.iter().map(|w| w.date).collect();
    dates.sort();
    dates.dedup();

    let Some(&last) = dates.last() else {
        return Streaks::default();
    };

    let mut longest = 0;
    let mut run = 1;
    for pair in dates.windows(2) {
        if (pair[1] - pair[0]).num_days() == 1 {
            run += 1;
        } else {
            longest = longest.max(run);
            run = 1;
        }
    }
    longest = longest.max(run);

    let current = if (today - last).num_days() <= 1 { run } else { 0 };

    Streaks { current, longest }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_workouts: usize,
    pub total_tonnage: f64,
    pub average_tonnage: f64,
    pub total_reps: u64,
    pub total_sets: usize,
    /// Date of the workout with the highest tonnage.
    pub best_day: Option<NaiveDate>,
    pub most_active_weekday: Option<Weekday>,
    pub unique_exercises: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
}

pub fn overview(workouts: &[Workout], today: NaiveDate) -> Overview {
    if workouts.is_empty() {
        return Overview::default();
    }

    let mut total_tonnage = 0.0;
    let mut total_reps = 0;
    let mut total_sets = 0;
    let mut best_tonnage = 0.0;
    let mut best_day = None;
    let mut names = std::collections::HashSet::new();
    let mut by_weekday: Vec<(Weekday, usize)> = Vec::new();

    for workout in workouts {
        let mut tonnage = 0.0;
        for exercise in singles(workout) {
            tonnage += exercise.tonnage();
            total_reps += exercise.total_reps();
            total_sets += exercise.sets.len();
            if !exercise.name.trim().is_empty() {
                names.insert(exercise_key(&exercise.name));
            }
        }
        total_tonnage += tonnage;

        if tonnage > best_tonnage {
            best_tonnage = tonnage;
            best_day = Some(workout.date);
        }

        let weekday = workout.date.weekday();
        match by_weekday.iter_mut().find(|(day, _)| *day == weekday) {
            Some((_, count)) => *count += 1,
            None => by_weekday.push((weekday, 1)),
        }
    }

    let mut most_active_weekday = None;
    let mut most = 0;
    for (day, count) in by_weekday {
        if count > most {
            most = count;
            most_active_weekday = Some(day);
        }
    }

    let streaks = streaks(workouts, today);

    Overview {
        total_workouts: workouts.len(),
        total_tonnage: round2(total_tonnage),
        average_tonnage: round2(total_tonnage / workouts.len() as f64),
        total_reps,
        total_sets,
        best_day,
        most_active_weekday,
        unique_exercises: names.len(),
        current_streak: streaks.current,
        longest_streak: streaks.longest,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    MaxWeight,
    MaxTonnage,
    MaxReps,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::MaxWeight => write!(f, "max weight"),
            RecordKind::MaxTonnage => write!(f, "max tonnage"),
            RecordKind::MaxReps => write!(f, "max reps"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalRecord {
    pub kind: RecordKind,
    pub exercise: String,
    pub value: f64,
    pub date: NaiveDate,
}

#[derive(Debug)]
struct Best {
    value: f64,
    date: Option<NaiveDate>,
}

impl Best {
    fn new() -> Self {
        Self {
            value: 0.0,
            date: None,
        }
    }

    fn offer(&mut self, value: f64, date: NaiveDate) {
        if value > self.value {
            self.value = value;
            self.date = Some(date);
        }
    }

    fn record(&self, kind: RecordKind, exercise: &str) -> Option<PersonalRecord> {
        self.date.map(|date| PersonalRecord {
            kind,
            exercise: exercise.to_string(),
            value: self.value,
            date,
        })
    }
}

/// Best weight, single-workout tonnage and single-set reps per exercise.
///
/// Sorted by value, highest first, and limited to [`MAX_RECORDS`].
pub fn personal_records(workouts: &[Workout]) -> Vec<PersonalRecord> {
    // (display name, max weight, max tonnage, max reps), in first-seen order
    let mut order: Vec<String> = Vec::new();
    let mut bests: HashMap<String, (String, Best, Best, Best)> = HashMap::new();

    for workout in workouts {
        let mut tonnage_here: HashMap<String, f64> = HashMap::new();

        for exercise in singles(workout) {
            if exercise.name.trim().is_empty() {
                continue;
            }
            let key = exercise_key(&exercise.name);
            let entry = bests.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                (
                    exercise.name.trim().to_string(),
                    Best::new(),
                    Best::new(),
                    Best::new(),
                )
            });

            for set in &exercise.sets {
                entry.1.offer(set.weight, workout.date);
                entry.3.offer(set.reps as f64, workout.date);
            }
            *tonnage_here.entry(key).or_insert(0.0) += exercise.tonnage();
        }

        for (key, tonnage) in tonnage_here {
            if let Some(entry) = bests.get_mut(&key) {
                entry.2.offer(round2(tonnage), workout.date);
            }
        }
    }

    let mut records = Vec::new();
    for key in &order {
        let Some((name, weight, tonnage, reps)) = bests.get(key) else {
            continue;
        };
        records.extend(weight.record(RecordKind::MaxWeight, name));
        records.extend(tonnage.record(RecordKind::MaxTonnage, name));
        records.extend(reps.record(RecordKind::MaxReps, name));
    }

    records.sort_by(|a, b| b.value.total_cmp(&a.value));
    records.truncate(MAX_RECORDS);
    records
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSummary {
    pub name: String,
    /// Times the exercise was logged.
    pub count: usize,
    pub sets: usize,
    pub reps: u64,
    pub max_weight: f64,
    pub tonnage: f64,
}

/// Totals per exercise, most frequently logged first.
pub fn exercise_summaries(workouts: &[Workout]) -> Vec<ExerciseSummary> {
    let mut summaries: Vec<ExerciseSummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for exercise in workouts.iter().flat_map(|w| singles(w)) {
        if exercise.name.trim().is_empty() {
            continue;
        }
        let key = exercise_key(&exercise.name);
        let i = *index.entry(key).or_insert_with(|| {
            summaries.push(ExerciseSummary {
                name: exercise.name.trim().to_string(),
                count: 0,
                sets: 0,
                reps: 0,
                max_weight: 0.0,
                tonnage: 0.0,
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[i];
        summary.count += 1;
        summary.sets += exercise.sets.len();
        summary.reps += exercise.total_reps();
        summary.max_weight = summary.max_weight.max(exercise.max_weight());
        summary.tonnage = round2(summary.tonnage + exercise.tonnage());
    }

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub max_weight: f64,
    pub tonnage: f64,
}

/// Per-workout progress for one exercise (matched case-insensitively), oldest first.
pub fn exercise_progress(workouts: &[Workout], exercise: &str) -> Vec<ProgressPoint> {
    let key = exercise_key(exercise);
    let mut points: Vec<ProgressPoint> = workouts
        .iter()
        .filter_map(|workout| {
            let matching: Vec<&SingleExercise> = singles(workout)
                .filter(|e| exercise_key(&e.name) == key)
                .collect();
            if matching.is_empty() {
                return None;
            }
            Some(ProgressPoint {
                date: workout.date,
                max_weight: matching.iter().map(|e| e.max_weight()).fold(0.0, f64::max),
                tonnage: round2(matching.iter().map(|e| e.tonnage()).sum()),
            })
        })
        .collect();

    points.sort_by_key(|p| p.date);
    points
}

/// First day of the week containing `date`; `first_day_of_week` is 0 for Sunday.
pub fn week_start(date: NaiveDate, first_day_of_week: u8) -> NaiveDate {
    let first = u32::from(first_day_of_week % 7);
    let offset = (date.weekday().num_days_from_sunday() + 7 - first) % 7;
    date - Duration::days(offset as i64)
}

pub fn workouts_this_week(workouts: &[Workout], today: NaiveDate, first_day_of_week: u8) -> usize {
    let start = week_start(today, first_day_of_week);
    workouts
        .iter()
        .filter(|w| w.date >= start && w.date <= today)
        .count()
}

/// Workouts per day for the `days` days ending today, oldest first.
pub fn daily_counts(workouts: &[Workout], today: NaiveDate, days: u32) -> Vec<(NaiveDate, usize)> {
    (0..days as i64)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let count = workouts.iter().filter(|w| w.date == date).count();
            (date, count)
        })
        .collect()
}

/// Recomputes the lifetime counters, keeping creation time and flags.
pub fn user_aggregate(workouts: &[Workout], previous: &UserData) -> UserData {
    let mut tonnage = 0.0;
    let mut sets = 0;
    let mut reps = 0;
    for exercise in workouts.iter().flat_map(|w| singles(w)) {
        tonnage += exercise.tonnage();
        sets += exercise.sets.len() as u64;
        reps += exercise.total_reps();
    }

    UserData {
        created_at: previous.created_at,
        updated_at: Some(Utc::now()),
        total_workouts: workouts.len() as u64,
        total_sets: sets,
        total_reps: reps,
        total_weight: round2(tonnage),
        has_seen_welcome: previous.has_seen_welcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Set, Superset};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn workout(d: &str, exercises: Vec<SingleExercise>) -> Workout {
        Workout::new(date(d)).with_exercises(exercises.into_iter().map(Into::into).collect())
    }

    fn bench(sets: &[(f64, u32)]) -> SingleExercise {
        SingleExercise::new("Bench Press")
            .with_sets(sets.iter().map(|(w, r)| Set::new(*w, *r)).collect())
    }

    #[test]
    fn test_workout_totals_scenario() {
        let w = workout("2024-03-04", vec![bench(&[(60.0, 10), (0.0, 5)])]);
        let totals = workout_totals(&w);
        assert_eq!(totals.tonnage, 600.0);
        assert_eq!(totals.reps, 15);
        assert_eq!(totals.sets, 2);
        assert_eq!(totals.max_weight, 60.0);
    }

    #[test]
    fn test_workout_totals_flattens_supersets() {
        let superset = Superset::new(vec![
            SingleExercise::new("Curl").with_sets(vec![Set::new(12.5, 10)]),
            SingleExercise::new("Pushdown").with_sets(vec![Set::new(20.0, 12), Set::new(22.5, 8)]),
        ])
        .unwrap();
        let mut w = Workout::new(date("2024-03-04"));
        w.add_exercise(superset);
        w.add_exercise(bench(&[(80.0, 5)]));

        let totals = workout_totals(&w);
        assert_eq!(totals.tonnage, 125.0 + 240.0 + 180.0 + 400.0);
        assert_eq!(totals.reps, 35);
        assert_eq!(totals.sets, 4);
        assert_eq!(totals.max_weight, 80.0);
    }

    #[test]
    fn test_workout_totals_rounds_to_cents() {
        let w = workout("2024-03-04", vec![bench(&[(0.1, 3)])]);
        assert_eq!(workout_totals(&w).tonnage, 0.3);
    }

    #[test]
    fn test_streaks_consecutive_days() {
        let workouts: Vec<Workout> = ["2024-03-01", "2024-03-02", "2024-03-03"]
            .iter()
            .map(|d| workout(d, vec![]))
            .collect();

        let s = streaks(&workouts, date("2024-03-03"));
        assert_eq!(s, Streaks { current: 3, longest: 3 });

        let s = streaks(&workouts, date("2024-03-04"));
        assert_eq!(s.current, 3);

        let s = streaks(&workouts, date("2024-03-05"));
        assert_eq!(s, Streaks { current: 0, longest: 3 });
    }

    #[test]
    fn test_streaks_gap_resets_run() {
        let workouts: Vec<Workout> = ["2024-03-03", "2024-03-01", "2024-03-05", "2024-03-02"]
            .iter()
            .map(|d| workout(d, vec![]))
            .collect();

        let s = streaks(&workouts, date("2024-03-05"));
        assert_eq!(s, Streaks { current: 1, longest: 3 });
    }

    #[test]
    fn test_streaks_same_day_counts_once() {
        let workouts = vec![
            workout("2024-03-01", vec![]),
            workout("2024-03-01", vec![]),
            workout("2024-03-02", vec![]),
        ];
        let s = streaks(&workouts, date("2024-03-02"));
        assert_eq!(s, Streaks { current: 2, longest: 2 });
        assert_eq!(streaks(&[], date("2024-03-02")), Streaks::default());
    }

    #[test]
    fn test_overview() {
        let workouts = vec![
            // Monday
            workout("2024-03-04", vec![bench(&[(60.0, 10)])]),
            // Tuesday
            workout("2024-03-05", vec![bench(&[(70.0, 10)])]),
            // Monday
            workout(
                "2024-03-11",
                vec![
                    bench(&[(50.0, 10)]),
                    SingleExercise::new("bench press").with_sets(vec![Set::new(0.0, 20)]),
                ],
            ),
        ];

        let o = overview(&workouts, date("2024-03-11"));
        assert_eq!(o.total_workouts, 3);
        assert_eq!(o.total_tonnage, 1800.0);
        assert_eq!(o.average_tonnage, 600.0);
        assert_eq!(o.total_reps, 50);
        assert_eq!(o.total_sets, 4);
        assert_eq!(o.best_day, Some(date("2024-03-05")));
        assert_eq!(o.most_active_weekday, Some(Weekday::Mon));
        assert_eq!(o.unique_exercises, 1);
        assert_eq!(o.current_streak, 1);
        assert_eq!(o.longest_streak, 2);
    }

    #[test]
    fn test_overview_sums_across_workouts() {
        let workouts = vec![
            workout("2024-01-01", vec![bench(&[(60.0, 10)])]),
            workout("2024-01-02", vec![bench(&[(0.0, 5)])]),
        ];

        let o = overview(&workouts, date("2024-01-02"));
        assert_eq!(o.total_workouts, 2);
        assert_eq!(o.total_tonnage, 600.0);
        assert_eq!(o.average_tonnage, 300.0);
        assert_eq!(o.total_reps, 15);
        assert_eq!(o.total_sets, 2);
        assert_eq!(o.best_day, Some(date("2024-01-01")));
        assert_eq!(o.current_streak, 2);
        assert_eq!(o.longest_streak, 2);
    }

    #[test]
    fn test_overview_best_day_ties_and_zero() {
        let workouts = vec![
            workout("2024-03-04", vec![bench(&[(0.0, 10)])]),
            workout("2024-03-05", vec![bench(&[(50.0, 2)])]),
            workout("2024-03-06", vec![bench(&[(25.0, 4)])]),
        ];
        let o = overview(&workouts, date("2024-03-06"));
        assert_eq!(o.best_day, Some(date("2024-03-05")));
        // Each weekday once: the first one seen wins
        assert_eq!(o.most_active_weekday, Some(Weekday::Mon));

        let o = overview(&workouts[..1], date("2024-03-06"));
        assert_eq!(o.best_day, None);
        assert_eq!(overview(&[], date("2024-03-06")), Overview::default());
    }

    #[test]
    fn test_personal_records() {
        let workouts = vec![
            workout(
                "2024-03-04",
                vec![
                    bench(&[(60.0, 10), (80.0, 3)]),
                    SingleExercise::new("Squat").with_sets(vec![Set::new(100.0, 5)]),
                ],
            ),
            workout("2024-03-06", vec![bench(&[(70.0, 12)]), bench(&[(20.0, 5)])]),
            workout(
                "2024-03-08",
                vec![SingleExercise::new("Plank").with_sets(vec![Set::new(0.0, 0)])],
            ),
        ];

        let records = personal_records(&workouts);
        let find = |kind: RecordKind, exercise: &str| {
            records
                .iter()
                .find(|r| r.kind == kind && r.exercise == exercise)
                .cloned()
        };

        let weight = find(RecordKind::MaxWeight, "Bench Press").unwrap();
        assert_eq!(weight.value, 80.0);
        assert_eq!(weight.date, date("2024-03-04"));

        // 70x12 + 20x5 in the same workout
        let tonnage = find(RecordKind::MaxTonnage, "Bench Press").unwrap();
        assert_eq!(tonnage.value, 940.0);
        assert_eq!(tonnage.date, date("2024-03-06"));

        assert_eq!(find(RecordKind::MaxReps, "Bench Press").unwrap().value, 12.0);
        assert_eq!(find(RecordKind::MaxTonnage, "Squat").unwrap().value, 500.0);

        // Zero-valued records are omitted
        assert!(records.iter().all(|r| r.exercise != "Plank"));

        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(values, sorted);
    }

    #[test]
    fn test_personal_records_limited() {
        let exercises: Vec<SingleExercise> = (1..=6)
            .map(|i| SingleExercise::new(format!("Lift {}", i)).with_sets(vec![Set::new(10.0, i)]))
            .collect();
        let records = personal_records(&[workout("2024-03-04", exercises)]);
        assert_eq!(records.len(), MAX_RECORDS);
        assert_eq!(records[0].value, 60.0);
    }

    #[test]
    fn test_exercise_summaries() {
        let workouts = vec![
            workout("2024-03-04", vec![bench(&[(60.0, 10)])]),
            workout(
                "2024-03-05",
                vec![
                    SingleExercise::new("Squat").with_sets(vec![Set::new(100.0, 5)]),
                    SingleExercise::new("bench press").with_sets(vec![Set::new(70.0, 8), Set::new(70.0, 6)]),
                ],
            ),
        ];

        let summaries = exercise_summaries(&workouts);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "Bench Press");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].sets, 3);
        assert_eq!(summaries[0].reps, 24);
        assert_eq!(summaries[0].max_weight, 70.0);
        assert_eq!(summaries[0].tonnage, 1580.0);
        assert_eq!(summaries[1].name, "Squat");
    }

    #[test]
    fn test_exercise_progress() {
        let workouts = vec![
            workout("2024-03-08", vec![bench(&[(75.0, 5)])]),
            workout("2024-03-04", vec![bench(&[(60.0, 10), (65.0, 8)])]),
            workout(
                "2024-03-06",
                vec![SingleExercise::new("Squat").with_sets(vec![Set::new(100.0, 5)])],
            ),
        ];

        let points = exercise_progress(&workouts, "BENCH PRESS");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date("2024-03-04"));
        assert_eq!(points[0].max_weight, 65.0);
        assert_eq!(points[0].tonnage, 1120.0);
        assert_eq!(points[1].max_weight, 75.0);
        assert!(exercise_progress(&workouts, "Deadlift").is_empty());
    }

    #[test]
    fn test_week_start() {
        // Wednesday
        let wed = date("2024-03-06");
        assert_eq!(week_start(wed, 1), date("2024-03-04"));
        assert_eq!(week_start(wed, 0), date("2024-03-03"));

        let sunday = date("2024-03-10");
        assert_eq!(week_start(sunday, 1), date("2024-03-04"));
        assert_eq!(week_start(sunday, 0), sunday);
    }

    #[test]
    fn test_workouts_this_week() {
        let workouts = vec![
            workout("2024-03-03", vec![]),
            workout("2024-03-04", vec![]),
            workout("2024-03-06", vec![]),
        ];
        assert_eq!(workouts_this_week(&workouts, date("2024-03-06"), 1), 2);
        assert_eq!(workouts_this_week(&workouts, date("2024-03-06"), 0), 3);
    }

    #[test]
    fn test_daily_counts() {
        let workouts = vec![
            workout("2024-03-05", vec![]),
            workout("2024-03-07", vec![]),
            workout("2024-03-07", vec![]),
        ];
        let counts = daily_counts(&workouts, date("2024-03-07"), 3);
        assert_eq!(
            counts,
            vec![
                (date("2024-03-05"), 1),
                (date("2024-03-06"), 0),
                (date("2024-03-07"), 2),
            ]
        );
    }

    #[test]
    fn test_user_aggregate() {
        let mut previous = UserData::new();
        previous.has_seen_welcome = true;

        let workouts = vec![
            workout("2024-03-04", vec![bench(&[(60.0, 10), (0.0, 5)])]),
            workout("2024-03-05", vec![bench(&[(50.0, 2)])]),
        ];
        let data = user_aggregate(&workouts, &previous);
        assert_eq!(data.created_at, previous.created_at);
        assert!(data.updated_at.is_some());
        assert!(data.has_seen_welcome);
        assert_eq!(data.total_workouts, 2);
        assert_eq!(data.total_sets, 3);
        assert_eq!(data.total_reps, 17);
        assert_eq!(data.total_weight, 700.0);
    }
}
