use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::models::{Client, Service};
use crate::validation::{required, BrokenValidations, Validate, Validation};

/// A booked slot: one client, one service, at a date and time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    id: i32,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    time: Option<NaiveTime>,
    #[serde(default, with = "crate::models::duration_minutes")]
    duration: Option<TimeDelta>,
    #[serde(default)]
    service: Option<Service>,
    #[serde(default)]
    client: Option<Client>,
    #[serde(skip)]
    broken: BrokenValidations,
}

const VALIDATIONS: &[Validation<Appointment>] = &[
    Validation {
        property: "date",
        responsible: &[],
        error_code: "validations.REQUIRED",
        is_valid: |a| required(&a.date),
    },
    Validation {
        property: "time",
        responsible: &[],
        error_code: "validations.REQUIRED",
        is_valid: |a| required(&a.time),
    },
    Validation {
        property: "duration",
        responsible: &[],
        error_code: "validations.REQUIRED",
        is_valid: |a| a.duration.is_some_and(|d| d > TimeDelta::zero()),
    },
    Validation {
        property: "service",
        responsible: &[],
        error_code: "validations.REQUIRED",
        is_valid: |a| required(&a.service),
    },
    Validation {
        property: "client",
        responsible: &[],
        error_code: "validations.REQUIRED",
        is_valid: |a| required(&a.client),
    },
];

impl Appointment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully specified appointment, as returned by the backend.
    pub fn scheduled(
        id: i32,
        start: NaiveDateTime,
        duration: TimeDelta,
        service: Service,
        client: Client,
    ) -> Self {
        Appointment {
            id,
            date: Some(start.date()),
            time: Some(start.time()),
            duration: Some(duration),
            service: Some(service),
            client: Some(client),
            broken: BrokenValidations::default(),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
        self.property_changed("date");
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    pub fn set_time(&mut self, time: Option<NaiveTime>) {
        self.time = time;
        self.property_changed("time");
    }

    pub fn duration(&self) -> Option<TimeDelta> {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Option<TimeDelta>) {
        self.duration = duration;
        self.property_changed("duration");
    }

    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    /// Pick a service; an unset duration defaults to the service's.
    pub fn set_service(&mut self, service: Option<Service>) {
        if self.duration.is_none()
            && let Some(duration) = service.as_ref().and_then(Service::duration)
        {
            self.set_duration(Some(duration));
        }
        self.service = service;
        self.property_changed("service");
    }

    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    pub fn set_client(&mut self, client: Option<Client>) {
        self.client = client;
        self.property_changed("client");
    }

    /// Date and time combined, if both are set.
    pub fn start(&self) -> Option<NaiveDateTime> {
        Some(self.date?.and_time(self.time?))
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        Some(self.start()? + self.duration?)
    }

    /// Order used by paged appointment lists: start, then id.
    pub fn chronological(a: &Appointment, b: &Appointment) -> std::cmp::Ordering {
        a.start().cmp(&b.start()).then(a.id.cmp(&b.id))
    }
}

impl Validate for Appointment {
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

impl Entity for Appointment {
    type Id = i32;

    fn id(&self) -> i32 {
        self.id
    }

    fn apply_update(&mut self, other: &Self) {
        self.date = other.date;
        self.time = other.time;
        self.duration = other.duration;
        self.service = other.service.clone();
        self.client = other.client.clone();
    }

    fn apply_server_validation_errors(&mut self, errors: &BTreeMap<String, String>) {
        Validate::apply_server_validation_errors(self, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 11)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn new_appointment_fails_every_required_rule() {
        let mut appointment = Appointment::new();

        assert!(!appointment.validate());
        for property in ["date", "time", "duration", "service", "client"] {
            assert_eq!(appointment.validation_error(property), Some("validations.REQUIRED"));
        }
    }

    #[test]
    fn choosing_a_service_fills_in_duration() {
        let mut appointment = Appointment::new();
        appointment.validate();

        appointment.set_service(Some(Service::new(2, "Cut", TimeDelta::minutes(40))));

        assert_eq!(appointment.duration(), Some(TimeDelta::minutes(40)));
        assert_eq!(appointment.validation_error("duration"), None);
        assert_eq!(appointment.validation_error("service"), None);
    }

    #[test]
    fn end_is_start_plus_duration() {
        let appointment = Appointment::scheduled(
            1,
            at(9, 30),
            TimeDelta::minutes(45),
            Service::new(1, "Cut", TimeDelta::minutes(45)),
            Client::new(1, "Ana"),
        );

        assert_eq!(appointment.end(), Some(at(10, 15)));
    }

    #[test]
    fn update_copies_fields_not_identity() {
        let mut stored = Appointment::scheduled(
            1,
            at(9, 0),
            TimeDelta::minutes(30),
            Service::new(1, "Cut", TimeDelta::minutes(30)),
            Client::new(1, "Ana"),
        );
        let mut moved = stored.clone();
        moved.set_id(99);
        moved.set_time(Some(NaiveTime::from_hms_opt(11, 0, 0).unwrap()));

        stored.apply_update(&moved);

        assert_eq!(stored.id(), 1);
        assert_eq!(stored.start(), Some(at(11, 0)));
    }
}
