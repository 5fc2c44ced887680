//! Local JSON store standing in for the booking backend.
//!
//! Each collection lives in its own file and is re-read on every call, so
//! concurrent `appy` invocations see each other's writes. Facilities are
//! listed in the data directory itself; every other collection belongs to
//! one facility and lives under `facility-<id>/`.
//!
//! The store performs the same checks the backend would: model validation
//! on create/edit and `NotFound` for unknown ids.

use std::cmp::Ordering;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use appy_core::api::{EntityApi, Params};
use appy_core::datasource::Direction;
use appy_core::models::{Appointment, CalendarDay, Client, Facility, Service, WorkingHour};
use appy_core::smart_cache::DateLoader;
use appy_core::validation::Validate;
use appy_core::{AppyError, AppyResult, Entity};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// A record kept in its own JSON file.
pub trait Record: Entity<Id = i32> + Validate + Serialize + DeserializeOwned {
    const FILE: &'static str;
    const KIND: &'static str;
    /// Whether each facility keeps its own collection.
    const PER_FACILITY: bool = true;

    /// Order of paged results.
    fn compare(a: &Self, b: &Self) -> Ordering;

    /// Whether the record lies on the forward side of the paging cursor
    /// described by `params`.
    fn is_forward(&self, _params: &Params) -> bool {
        true
    }

    /// Filter applied by `get_all`.
    fn matches(&self, _params: &Params) -> bool {
        true
    }
}

fn param<V: DeserializeOwned>(params: &Params, key: &str) -> Option<V> {
    serde_json::from_value(params.get(key)?.clone()).ok()
}

impl Record for Appointment {
    const FILE: &'static str = "appointments.json";
    const KIND: &'static str = "Appointment";

    fn compare(a: &Self, b: &Self) -> Ordering {
        Appointment::chronological(a, b)
    }

    /// `from`: appointments starting at or after it page forwards.
    fn is_forward(&self, params: &Params) -> bool {
        match param::<NaiveDateTime>(params, "from") {
            Some(from) => self.start().is_some_and(|start| start >= from),
            None => true,
        }
    }

    /// `date`: only appointments on that date.
    fn matches(&self, params: &Params) -> bool {
        match param::<NaiveDate>(params, "date") {
            Some(date) => self.date() == Some(date),
            None => true,
        }
    }
}

impl Record for WorkingHour {
    const FILE: &'static str = "working_hours.json";
    const KIND: &'static str = "Working hour";

    fn compare(a: &Self, b: &Self) -> Ordering {
        a.day_of_week()
            .num_days_from_monday()
            .cmp(&b.day_of_week().num_days_from_monday())
            .then(a.time_from().cmp(&b.time_from()))
            .then(a.id().cmp(&b.id()))
    }
}

impl Record for Service {
    const FILE: &'static str = "services.json";
    const KIND: &'static str = "Service";

    fn compare(a: &Self, b: &Self) -> Ordering {
        a.name().cmp(b.name()).then(a.id().cmp(&b.id()))
    }
}

impl Record for Facility {
    const FILE: &'static str = "facilities.json";
    const KIND: &'static str = "Facility";
    const PER_FACILITY: bool = false;

    fn compare(a: &Self, b: &Self) -> Ordering {
        a.id().cmp(&b.id())
    }
}

impl Record for Client {
    const FILE: &'static str = "clients.json";
    const KIND: &'static str = "Client";

    fn compare(a: &Self, b: &Self) -> Ordering {
        a.name().cmp(b.name()).then(a.id().cmp(&b.id()))
    }
}

/// One collection file.
#[derive(Debug)]
pub struct JsonStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonStore<T> {
    fn clone(&self) -> Self {
        JsonStore {
            path: self.path.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> JsonStore<T> {
    /// The collection seen by `facility_id`. Shared collections ignore it.
    pub fn open(data_dir: &Path, facility_id: i32) -> Self {
        let dir = if T::PER_FACILITY {
            data_dir.join(format!("facility-{facility_id}"))
        } else {
            data_dir.to_path_buf()
        };

        JsonStore {
            path: dir.join(T::FILE),
            _record: PhantomData,
        }
    }

    /// All records in file order. A missing file is an empty collection.
    pub fn read_all(&self) -> AppyResult<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, records: &[T]) -> AppyResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Replace the whole collection, renumbering ids from 1.
    pub fn replace_all(&self, records: &[T]) -> AppyResult<Vec<T>> {
        let renumbered = records
            .iter()
            .zip(1..)
            .map(|(record, id)| with_id(record, id))
            .collect::<AppyResult<Vec<T>>>()?;

        self.write_all(&renumbered)?;
        debug!(file = T::FILE, count = renumbered.len(), "collection replaced");
        Ok(renumbered)
    }

    fn not_found(id: i32) -> AppyError {
        AppyError::NotFound(format!("{} {id}", T::KIND))
    }

    fn find(&self, id: i32) -> AppyResult<T> {
        self.read_all()?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))
    }

    fn insert(&self, record: &T) -> AppyResult<T> {
        check(record)?;

        let mut records = self.read_all()?;
        let id = records.iter().map(Entity::id).max().unwrap_or(0) + 1;
        let created = with_id(record, id)?;
        records.push(created.clone());
        self.write_all(&records)?;

        debug!(file = T::FILE, id, "record created");
        Ok(created)
    }

    fn update(&self, record: &T) -> AppyResult<T> {
        check(record)?;

        let mut records = self.read_all()?;
        let id = record.id();
        let stored = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        stored.apply_update(record);
        let updated = stored.clone();
        self.write_all(&records)?;

        debug!(file = T::FILE, id, "record updated");
        Ok(updated)
    }

    fn remove(&self, id: i32) -> AppyResult<()> {
        let mut records = self.read_all()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(Self::not_found(id));
        }

        self.write_all(&records)?;
        debug!(file = T::FILE, id, "record deleted");
        Ok(())
    }

    /// Records on one side of the cursor, ordered outward from it.
    fn page(&self, params: &Params, direction: Direction, skip: usize, take: usize) -> AppyResult<Vec<T>> {
        let forwards = direction == Direction::Forwards;
        let mut side: Vec<T> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.is_forward(params) == forwards)
            .collect();

        side.sort_by(T::compare);
        if !forwards {
            side.reverse();
        }

        Ok(side.into_iter().skip(skip).take(take).collect())
    }
}

/// Server-side validation: the same rules the client runs.
fn check<T: Record>(record: &T) -> AppyResult<()> {
    let mut candidate = record.clone();
    if candidate.validate() {
        Ok(())
    } else {
        Err(AppyError::Validation(candidate.broken_validations().first_errors()))
    }
}

fn with_id<T: Record>(record: &T, id: i32) -> AppyResult<T> {
    let mut value = serde_json::to_value(record)?;
    if let Some(fields) = value.as_object_mut() {
        fields.insert("id".to_string(), id.into());
    }
    Ok(serde_json::from_value(value)?)
}

fn ready<V: 'static>(result: AppyResult<V>) -> LocalBoxFuture<'static, AppyResult<V>> {
    future::ready(result).boxed_local()
}

impl<T: Record> EntityApi<T> for JsonStore<T> {
    fn get_all(&self, params: &Params) -> LocalBoxFuture<'static, AppyResult<Vec<T>>> {
        let result = self
            .read_all()
            .map(|records| records.into_iter().filter(|r| r.matches(params)).collect());
        ready(result)
    }

    fn get_list(
        &self,
        params: &Params,
        direction: Direction,
        skip: usize,
        take: usize,
    ) -> LocalBoxFuture<'static, AppyResult<Vec<T>>> {
        ready(self.page(params, direction, skip, take))
    }

    fn get(&self, id: &i32) -> LocalBoxFuture<'static, AppyResult<T>> {
        ready(self.find(*id))
    }

    fn add_new(&self, entity: &T) -> LocalBoxFuture<'static, AppyResult<T>> {
        ready(self.insert(entity))
    }

    fn edit(&self, entity: &T) -> LocalBoxFuture<'static, AppyResult<T>> {
        ready(self.update(entity))
    }

    fn delete(&self, id: &i32) -> LocalBoxFuture<'static, AppyResult<()>> {
        ready(self.remove(*id))
    }
}

/// Loads one `CalendarDay` of a facility: that date's appointments plus the
/// working hours of its weekday.
pub fn day_loader(data_dir: &Path, facility_id: i32) -> Rc<dyn DateLoader<CalendarDay>> {
    let appointments = JsonStore::<Appointment>::open(data_dir, facility_id);
    let hours = JsonStore::<WorkingHour>::open(data_dir, facility_id);

    Rc::new(
        move |date: NaiveDate| -> LocalBoxFuture<'static, AppyResult<CalendarDay>> {
            ready(load_day(&appointments, &hours, date))
        },
    )
}

fn load_day(
    appointments: &JsonStore<Appointment>,
    hours: &JsonStore<WorkingHour>,
    date: NaiveDate,
) -> AppyResult<CalendarDay> {
    let mut on_date: Vec<Appointment> = appointments
        .read_all()?
        .into_iter()
        .filter(|a| a.date() == Some(date))
        .collect();
    on_date.sort_by(Appointment::chronological);

    let mut working_hours: Vec<WorkingHour> = hours
        .read_all()?
        .into_iter()
        .filter(|w| w.day_of_week() == date.weekday())
        .collect();
    working_hours.sort_by(WorkingHour::compare);

    Ok(CalendarDay::new(date, on_date, working_hours))
}
