use chrono::{Local, NaiveDate};
use clap::ValueEnum;

mod config_cmd;
mod data;
mod draft;
mod food;
mod stats;
mod sync_cmd;
mod workout;

pub use config_cmd::ConfigCommand;
pub use data::DataCommand;
pub use draft::DraftCommand;
pub use food::FoodCommand;
pub use stats::StatsCommand;
pub use sync_cmd::SyncCommand;
pub use workout::WorkoutCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses a `YYYY-MM-DD` date, defaulting to today.
pub fn parse_date_or_today(date: Option<&str>) -> Result<NaiveDate, String> {
    match date {
        Some(d) => parse_date(d),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn parse_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", date))
}

/// Formats a weight, removing unnecessary decimal places.
pub fn format_weight(kg: f64) -> String {
    if kg.fract() == 0.0 {
        format!("{} kg", kg as i64)
    } else {
        format!("{:.1} kg", kg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        let err = parse_date("05/03/2024").unwrap_err();
        assert!(err.contains("Use YYYY-MM-DD"));
        assert!(parse_date_or_today(None).is_ok());
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(600.0), "600 kg");
        assert_eq!(format_weight(62.5), "62.5 kg");
    }
}
