use std::collections::BTreeMap;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{AppyError, AppyResult};
use crate::validation::{required, BrokenValidations, Validate, Validation};

pub const TIMES_NOT_IN_ORDER: &str = "pages.working-hours.errors.TIMES_NOT_IN_ORDER";
pub const TIMES_OVERLAP: &str = "pages.working-hours.errors.TIMES_OVERLAP";

/// Opening hours of a facility on one weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHour {
    #[serde(default)]
    id: i32,
    day_of_week: Weekday,
    #[serde(default)]
    time_from: Option<NaiveTime>,
    #[serde(default)]
    time_to: Option<NaiveTime>,
    #[serde(skip)]
    broken: BrokenValidations,
}

const VALIDATIONS: &[Validation<WorkingHour>] = &[
    Validation {
        property: "time_from",
        responsible: &[],
        error_code: "validations.REQUIRED",
        is_valid: |w| required(&w.time_from),
    },
    Validation {
        property: "time_to",
        responsible: &[],
        error_code: "validations.REQUIRED",
        is_valid: |w| required(&w.time_to),
    },
    Validation {
        property: "time_to",
        responsible: &["time_from"],
        error_code: TIMES_NOT_IN_ORDER,
        is_valid: |w| match (w.time_from, w.time_to) {
            (Some(from), Some(to)) => from < to,
            _ => true,
        },
    },
];

impl WorkingHour {
    pub fn new(id: i32, day_of_week: Weekday, time_from: NaiveTime, time_to: NaiveTime) -> Self {
        WorkingHour {
            id,
            day_of_week,
            time_from: Some(time_from),
            time_to: Some(time_to),
            broken: BrokenValidations::default(),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn day_of_week(&self) -> Weekday {
        self.day_of_week
    }

    pub fn set_day_of_week(&mut self, day_of_week: Weekday) {
        self.day_of_week = day_of_week;
        self.property_changed("day_of_week");
    }

    pub fn time_from(&self) -> Option<NaiveTime> {
        self.time_from
    }

    pub fn set_time_from(&mut self, time_from: Option<NaiveTime>) {
        self.time_from = time_from;
        self.property_changed("time_from");
    }

    pub fn time_to(&self) -> Option<NaiveTime> {
        self.time_to
    }

    pub fn set_time_to(&mut self, time_to: Option<NaiveTime>) {
        self.time_to = time_to;
        self.property_changed("time_to");
    }
}

impl Validate for WorkingHour {
    fn validations() -> &'static [Validation<Self>] {
        VALIDATIONS
    }

    fn broken_validations(&self) -> &BrokenValidations {
        &self.broken
    }

    fn broken_validations_mut(&mut self) -> &mut BrokenValidations {
        &mut self.broken
    }
}

impl Entity for WorkingHour {
    type Id = i32;

    fn id(&self) -> i32 {
        self.id
    }

    fn apply_update(&mut self, other: &Self) {
        self.day_of_week = other.day_of_week;
        self.time_from = other.time_from;
        self.time_to = other.time_to;
    }

    fn apply_server_validation_errors(&mut self, errors: &BTreeMap<String, String>) {
        Validate::apply_server_validation_errors(self, errors);
    }
}

/// Check a full weekly schedule before it replaces the stored one.
///
/// Every entry must start before it ends, and entries of the same weekday
/// may neither overlap nor touch. Entries with a missing time are rejected
/// as out of order.
pub fn validate_schedule(hours: &[WorkingHour]) -> AppyResult<()> {
    let mut spans = Vec::with_capacity(hours.len());
    for hour in hours {
        match (hour.time_from, hour.time_to) {
            (Some(from), Some(to)) if from < to => spans.push((hour.day_of_week, from, to)),
            _ => return Err(AppyError::validation("working_hours", TIMES_NOT_IN_ORDER)),
        }
    }

    for (i, &(day, from, to)) in spans.iter().enumerate() {
        let clash = spans[i + 1..]
            .iter()
            .any(|&(other_day, other_from, other_to)| {
                other_day == day && from <= other_to && to >= other_from
            });
        if clash {
            return Err(AppyError::validation("working_hours", TIMES_OVERLAP));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn hours(day: Weekday, from: NaiveTime, to: NaiveTime) -> WorkingHour {
        WorkingHour::new(0, day, from, to)
    }

    #[test]
    fn valid_split_schedule_passes() {
        let schedule = vec![
            hours(Weekday::Mon, t(8, 0), t(12, 0)),
            hours(Weekday::Mon, t(13, 0), t(17, 0)),
            hours(Weekday::Tue, t(8, 0), t(17, 0)),
        ];

        assert_eq!(validate_schedule(&schedule), Ok(()));
    }

    #[test]
    fn reversed_times_are_rejected() {
        let schedule = vec![hours(Weekday::Mon, t(12, 0), t(8, 0))];

        assert_eq!(
            validate_schedule(&schedule),
            Err(AppyError::validation("working_hours", TIMES_NOT_IN_ORDER))
        );
    }

    #[test]
    fn touching_entries_count_as_overlap() {
        let schedule = vec![
            hours(Weekday::Wed, t(8, 0), t(12, 0)),
            hours(Weekday::Wed, t(12, 0), t(16, 0)),
        ];

        assert_eq!(
            validate_schedule(&schedule),
            Err(AppyError::validation("working_hours", TIMES_OVERLAP))
        );
    }

    #[test]
    fn same_times_on_different_days_do_not_clash() {
        let schedule = vec![
            hours(Weekday::Mon, t(8, 0), t(12, 0)),
            hours(Weekday::Fri, t(8, 0), t(12, 0)),
        ];

        assert!(validate_schedule(&schedule).is_ok());
    }

    #[test]
    fn moving_start_past_end_breaks_time_to() {
        let mut hour = hours(Weekday::Mon, t(8, 0), t(12, 0));
        hour.set_time_from(Some(t(13, 0)));

        assert_eq!(hour.validation_error("time_to"), Some(TIMES_NOT_IN_ORDER));
    }
}
