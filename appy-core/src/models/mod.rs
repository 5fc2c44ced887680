//! Booking domain models.

pub mod appointment;
pub mod calendar_day;
pub mod client;
pub mod facility;
pub mod free_time;
pub mod service;
pub mod working_hour;

pub use appointment::Appointment;
pub use calendar_day::CalendarDay;
pub use client::Client;
pub use facility::Facility;
pub use free_time::FreeTime;
pub use service::Service;
pub use working_hour::{WorkingHour, validate_schedule};

/// Serde adapter storing an optional `TimeDelta` as whole minutes.
pub(crate) mod duration_minutes {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<TimeDelta>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.num_minutes()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<TimeDelta>, D::Error> {
        let minutes = Option::<i64>::deserialize(deserializer)?;
        Ok(minutes.map(TimeDelta::minutes))
    }
}
