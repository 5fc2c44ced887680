pub mod appointments;
pub mod clients;
pub mod day;
pub mod delete;
pub mod hours;
pub mod new;
pub mod services;

use anyhow::{Context, Result};
use appy_core::AppyError;
use appy_core::notify::{Notification, Subscription};
use chrono::{NaiveDateTime, TimeDelta};

use crate::render::render_validation_errors;

/// Accepted spellings of a start date/time.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parse "2024-03-11T09:00" or "2024-03-11 09:00".
pub fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input.trim(), format).ok())
        .ok_or_else(|| anyhow::anyhow!("Could not parse date/time: \"{}\" (expected YYYY-MM-DDTHH:MM)", input))
}

/// Parse a duration like "45m" or "1h 30m".
pub fn parse_duration(input: &str) -> Result<TimeDelta> {
    let std_dur = humantime::parse_duration(input)
        .with_context(|| format!("Could not parse duration: \"{}\"", input))?;
    TimeDelta::from_std(std_dur).context("Duration too large")
}

/// Wait for the first snapshot a list subscription publishes.
pub async fn first_snapshot<T>(mut subscription: Subscription<Vec<T>>) -> Result<Vec<T>> {
    match subscription.next().await {
        Some(Notification::Next(items)) => Ok(items),
        Some(Notification::Error(e)) => Err(e.into()),
        None => anyhow::bail!("Datasource closed before it loaded"),
    }
}

/// Turn a rejected write into a user-facing error listing every property.
pub fn explain(error: AppyError) -> anyhow::Error {
    match error {
        AppyError::Validation(errors) => {
            anyhow::anyhow!("Validation failed:\n{}", render_validation_errors(&errors))
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn nine_am() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 11)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn parse_datetime_accepts_t_and_space() {
        assert_eq!(parse_datetime("2024-03-11T09:00").unwrap(), nine_am());
        assert_eq!(parse_datetime("2024-03-11 09:00").unwrap(), nine_am());
        assert_eq!(parse_datetime("2024-03-11T09:00:00").unwrap(), nine_am());
    }

    #[test]
    fn parse_datetime_rejects_date_only() {
        assert!(parse_datetime("2024-03-11").is_err());
    }

    #[test]
    fn parse_duration_minutes_and_hours() {
        assert_eq!(parse_duration("45m").unwrap(), TimeDelta::minutes(45));
        assert_eq!(parse_duration("1h 30m").unwrap(), TimeDelta::minutes(90));
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn explain_lists_validation_codes() {
        let error = explain(AppyError::validation("client", "validations.REQUIRED"));

        let message = error.to_string();
        assert!(message.contains("client:"));
        assert!(message.contains("validations.REQUIRED"));
    }
}
