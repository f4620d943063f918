use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One set of an exercise: weight in kilograms and a rep count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Set {
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub reps: u32,
}

impl Set {
    pub fn new(weight: f64, reps: u32) -> Self {
        Self { weight, reps }
    }

    /// Weight moved in this set (weight × reps).
    pub fn tonnage(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

impl std::str::FromStr for Set {
    type Err = String;

    /// Parses `WEIGHTxREPS`, e.g. `60x10` or `62.5x8`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (weight, reps) = s
            .trim()
            .split_once(['x', 'X', '*'])
            .ok_or_else(|| format!("Invalid set '{}'. Use WEIGHTxREPS, e.g. 60x10", s))?;

        let weight: f64 = weight
            .trim()
            .parse()
            .map_err(|_| format!("Invalid weight in set '{}'", s))?;
        let reps: u32 = reps
            .trim()
            .parse()
            .map_err(|_| format!("Invalid reps in set '{}'", s))?;

        if weight < 0.0 || !weight.is_finite() {
            return Err(format!("Weight must be non-negative in set '{}'", s));
        }

        Ok(Self { weight, reps })
    }
}

/// A single named exercise with its sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleExercise {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<Set>,
}

impl SingleExercise {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sets: Vec::new(),
        }
    }

    pub fn with_sets(mut self, sets: Vec<Set>) -> Self {
        self.sets = sets;
        self
    }

    pub fn tonnage(&self) -> f64 {
        self.sets.iter().map(Set::tonnage).sum()
    }

    pub fn total_reps(&self) -> u64 {
        self.sets.iter().map(|s| u64::from(s.reps)).sum()
    }

    pub fn max_weight(&self) -> f64 {
        self.sets.iter().map(|s| s.weight).fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum SupersetKind {
    #[default]
    #[serde(rename = "superset")]
    Superset,
}

/// Two or more exercises performed back to back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Superset {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(rename = "type")]
    kind: SupersetKind,
    pub exercises: Vec<SingleExercise>,
}

impl Superset {
    /// Builds a superset. Fails when given fewer than two exercises.
    pub fn new(exercises: Vec<SingleExercise>) -> Result<Self, String> {
        if exercises.len() < 2 {
            return Err(format!(
                "A superset needs at least 2 exercises, got {}",
                exercises.len()
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind: SupersetKind::Superset,
            exercises,
        })
    }
}

/// An entry in a workout: either a single exercise or a superset.
///
/// Singles are stored untagged; supersets carry `"type": "superset"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Exercise {
    Superset(Superset),
    Single(SingleExercise),
}

impl Exercise {
    pub fn id(&self) -> Uuid {
        match self {
            Exercise::Single(e) => e.id,
            Exercise::Superset(s) => s.id,
        }
    }

    /// Display name. Supersets join their members with " + ".
    pub fn name(&self) -> String {
        match self {
            Exercise::Single(e) => e.name.clone(),
            Exercise::Superset(s) => s
                .exercises
                .iter()
                .map(|e| e.name.as_str())
                .collect::<Vec<_>>()
                .join(" + "),
        }
    }

    /// The single exercises this entry consists of (supersets flattened).
    pub fn singles(&self) -> &[SingleExercise] {
        match self {
            Exercise::Single(e) => std::slice::from_ref(e),
            Exercise::Superset(s) => &s.exercises,
        }
    }

    pub fn sets_count(&self) -> usize {
        self.singles().iter().map(|e| e.sets.len()).sum()
    }
}

impl From<SingleExercise> for Exercise {
    fn from(e: SingleExercise) -> Self {
        Exercise::Single(e)
    }
}

impl From<Superset> for Exercise {
    fn from(s: Superset) -> Self {
        Exercise::Superset(s)
    }
}

/// A workout: everything done on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl Workout {
    pub fn new(date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            date,
            exercises: Vec::new(),
            created_at: now,
            updated_at: now,
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_exercises(mut self, exercises: Vec<Exercise>) -> Self {
        self.exercises = exercises;
        self
    }

    pub fn add_exercise(&mut self, exercise: impl Into<Exercise>) {
        self.exercises.push(exercise.into());
        self.touch();
    }

    /// Removes the exercise at `index`, returning it if it existed.
    pub fn remove_exercise(&mut self, index: usize) -> Option<Exercise> {
        if index >= self.exercises.len() {
            return None;
        }
        let removed = self.exercises.remove(index);
        self.touch();
        Some(removed)
    }

    /// Records the start time unless one is already set.
    pub fn start(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Utc::now());
        }
    }

    pub fn finish(&mut self) {
        self.end_time = Some(Utc::now());
        self.touch();
    }

    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Workout: {}", self.date)?;
        writeln!(f, "{}", "=".repeat(30))?;

        if let Some(duration) = self.duration() {
            let minutes = duration.num_minutes();
            if minutes > 60 {
                writeln!(f, "Duration: {}h {}m", minutes / 60, minutes % 60)?;
            } else {
                writeln!(f, "Duration: {}m", minutes)?;
            }
        }

        for (i, exercise) in self.exercises.iter().enumerate() {
            match exercise {
                Exercise::Single(e) => {
                    writeln!(f, "{}. {}", i + 1, e.name)?;
                    write_sets(f, &e.sets, "   ")?;
                }
                Exercise::Superset(s) => {
                    writeln!(f, "{}. Superset", i + 1)?;
                    for e in &s.exercises {
                        writeln!(f, "   - {}", e.name)?;
                        write_sets(f, &e.sets, "     ")?;
                    }
                }
            }
        }

        Ok(())
    }
}

fn write_sets(f: &mut fmt::Formatter<'_>, sets: &[Set], indent: &str) -> fmt::Result {
    for (n, set) in sets.iter().enumerate() {
        writeln!(f, "{}set {}: {} kg x {}", indent, n + 1, set.weight, set.reps)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_set_from_str() {
        assert_eq!("60x10".parse::<Set>().unwrap(), Set::new(60.0, 10));
        assert_eq!("62.5X8".parse::<Set>().unwrap(), Set::new(62.5, 8));
        assert_eq!(" 0 x 5 ".parse::<Set>().unwrap(), Set::new(0.0, 5));
        assert!("60".parse::<Set>().is_err());
        assert!("-5x10".parse::<Set>().is_err());
        assert!("60x-1".parse::<Set>().is_err());
    }

    #[test]
    fn test_single_exercise_totals() {
        let e = SingleExercise::new("Bench")
            .with_sets(vec![Set::new(60.0, 10), Set::new(70.0, 5)]);
        assert_eq!(e.tonnage(), 950.0);
        assert_eq!(e.total_reps(), 15);
        assert_eq!(e.max_weight(), 70.0);
    }

    #[test]
    fn test_superset_requires_two() {
        assert!(Superset::new(vec![SingleExercise::new("A")]).is_err());
        assert!(Superset::new(vec![SingleExercise::new("A"), SingleExercise::new("B")]).is_ok());
    }

    #[test]
    fn test_exercise_json_shapes() {
        let single: Exercise = SingleExercise::new("Bench")
            .with_sets(vec![Set::new(60.0, 10)])
            .into();
        let value = serde_json::to_value(&single).unwrap();
        assert!(value.get("type").is_none());
        assert_eq!(value["name"], "Bench");

        let superset: Exercise = Superset::new(vec![
            SingleExercise::new("Curl"),
            SingleExercise::new("Pushdown"),
        ])
        .unwrap()
        .into();
        let value = serde_json::to_value(&superset).unwrap();
        assert_eq!(value["type"], "superset");
        assert_eq!(value["exercises"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_exercise_parses_minimal_json() {
        let single: Exercise =
            serde_json::from_value(json!({"name": "Bench", "sets": [{"weight": 60, "reps": 10}]}))
                .unwrap();
        assert!(matches!(single, Exercise::Single(_)));
        assert_eq!(single.sets_count(), 1);

        let superset: Exercise = serde_json::from_value(json!({
            "type": "superset",
            "exercises": [
                {"name": "Curl", "sets": [{"weight": 10, "reps": 12}]},
                {"name": "Pushdown", "sets": []}
            ]
        }))
        .unwrap();
        assert!(matches!(superset, Exercise::Superset(_)));
        assert_eq!(superset.name(), "Curl + Pushdown");
        assert_eq!(superset.singles().len(), 2);
    }

    #[test]
    fn test_workout_parses_camel_case() {
        let workout: Workout = serde_json::from_value(json!({
            "date": "2024-01-01",
            "exercises": [{"name": "Bench", "sets": [{"weight": 60, "reps": 10}]}],
            "startTime": "2024-01-01T10:00:00Z",
            "endTime": "2024-01-01T11:30:00Z"
        }))
        .unwrap();

        assert_eq!(workout.date, date("2024-01-01"));
        assert_eq!(workout.exercises.len(), 1);
        assert_eq!(workout.duration().unwrap().num_minutes(), 90);

        let value = serde_json::to_value(&workout).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("startTime").is_some());
    }

    #[test]
    fn test_remove_exercise() {
        let mut workout = Workout::new(date("2024-01-01"));
        workout.add_exercise(SingleExercise::new("A"));
        workout.add_exercise(SingleExercise::new("B"));

        assert!(workout.remove_exercise(5).is_none());
        let removed = workout.remove_exercise(0).unwrap();
        assert_eq!(removed.name(), "A");
        assert_eq!(workout.exercises.len(), 1);
    }

    #[test]
    fn test_start_keeps_first_time() {
        let mut workout = Workout::new(date("2024-01-01"));
        workout.start();
        let first = workout.start_time;
        workout.start();
        assert_eq!(workout.start_time, first);
        assert!(workout.duration().is_none());
    }

    #[test]
    fn test_workout_display() {
        let workout = Workout::new(date("2024-01-01")).with_exercises(vec![SingleExercise::new(
            "Bench",
        )
        .with_sets(vec![Set::new(60.0, 10)])
        .into()]);

        let output = format!("{}", workout);
        assert!(output.contains("2024-01-01"));
        assert!(output.contains("Bench"));
        assert!(output.contains("60 kg x 10"));
    }
}
