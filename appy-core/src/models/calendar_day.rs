use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::{Appointment, WorkingHour};

/// Everything the calendar needs to draw one date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
    #[serde(default)]
    pub working_hours: Vec<WorkingHour>,
}

impl CalendarDay {
    pub fn new(date: NaiveDate, appointments: Vec<Appointment>, working_hours: Vec<WorkingHour>) -> Self {
        CalendarDay {
            date: Some(date),
            appointments,
            working_hours,
        }
    }

    /// Earliest start and latest end over working hours and appointments,
    /// as times of day. `None` when the day has nothing with both ends set.
    pub fn time_bounds(&self) -> Option<(NaiveTime, NaiveTime)> {
        let hours = self
            .working_hours
            .iter()
            .filter_map(|w| Some((w.time_from()?, w.time_to()?)));
        let appointments = self
            .appointments
            .iter()
            .filter_map(|a| Some((a.time()?, end_time_of_day(a.start()?, a.end()?))));

        hours.chain(appointments).reduce(|(from, to), (f, t)| (from.min(f), to.max(t)))
    }
}

/// Appointments running past midnight end at the last minute of their day.
pub(crate) fn end_time_of_day(start: NaiveDateTime, end: NaiveDateTime) -> NaiveTime {
    if end.date() > start.date() {
        NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
    } else {
        end.time()
    }
}
