//! Layout of one calendar day.
//!
//! Turns appointments, working hours and free times into rendered intervals
//! for a visible time-of-day window, plus the helpers the day grid needs:
//! hour rows, click-to-time and the current-time indicator.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use tracing::debug;

use crate::interval::{crop, invert_times, rendered_interval, RenderedInterval};
use crate::models::{Appointment, CalendarDay, FreeTime, WorkingHour};

/// Hours shown on one screen height of the scroller.
const HOURS_PER_SCREEN: f64 = 8.0;

/// Click positions snap to this many minutes.
const CLICK_SNAP_MINUTES: u32 = 5;

/// A time-of-day range shown by the day grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: NaiveTime,
    pub to: NaiveTime,
}

impl Default for TimeWindow {
    /// 08:00 to 14:00, used when the shown days have nothing scheduled.
    fn default() -> Self {
        TimeWindow {
            from: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            to: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl TimeWindow {
    pub fn new(from: NaiveTime, to: NaiveTime) -> Self {
        TimeWindow { from, to }
    }

    /// The window anchored on `date`.
    pub fn on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (date.and_time(self.from), date.and_time(self.to))
    }

    pub fn length(&self) -> TimeDelta {
        self.to - self.from
    }

    /// Scroller height in viewport-height units.
    pub fn height_vh(&self) -> f64 {
        let hours = self.length().num_seconds() as f64 / 3600.0;
        hours / HOURS_PER_SCREEN * 100.0
    }
}

/// Smallest window holding every working hour and appointment of the shown
/// days plus the shadow appointments, or the default window when there
/// is nothing to show.
pub fn visible_time_window<'a>(
    shown_days: impl IntoIterator<Item = &'a CalendarDay>,
    shadow_appointments: &[Appointment],
) -> TimeWindow {
    let days = shown_days.into_iter().filter_map(CalendarDay::time_bounds);
    let shadows = shadow_appointments.iter().filter_map(|a| {
        let start = a.start()?;
        Some((start.time(), crate::models::calendar_day::end_time_of_day(start, a.end()?)))
    });

    let bounds = days
        .chain(shadows)
        .reduce(|(from, to), (f, t)| (from.min(f), to.max(t)));

    let window = match bounds {
        Some((from, to)) => TimeWindow::new(from, to),
        None => TimeWindow::default(),
    };
    debug!(from = %window.from, to = %window.to, "visible time window");
    window
}

/// Background state of a span of the day grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeStatus {
    Free,
    Taken,
    Closed,
}

impl TimeStatus {
    pub fn class_name(&self) -> &'static str {
        match self {
            TimeStatus::Free => "free-time",
            TimeStatus::Taken => "taken-time",
            TimeStatus::Closed => "closed-time",
        }
    }
}

/// Output of one render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayRender {
    pub appointments: Vec<RenderedInterval<Appointment>>,
    pub shadow_appointments: Vec<RenderedInterval<Appointment>>,
    pub time_statuses: Vec<RenderedInterval<TimeStatus>>,
}

/// Inputs of a render pass. `None` for free times or working hours means
/// "not known", which draws no statuses of that kind; an empty list means
/// "known to be empty".
#[derive(Debug, Clone, Copy, Default)]
pub struct DayContent<'a> {
    pub appointments: &'a [Appointment],
    pub shadow_appointments: &'a [Appointment],
    pub free_times: Option<&'a [FreeTime]>,
    pub working_hours: Option<&'a [WorkingHour]>,
}

/// One day of the calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayView {
    pub date: NaiveDate,
    pub window: TimeWindow,
}

impl DayView {
    pub fn new(date: NaiveDate, window: TimeWindow) -> Self {
        DayView { date, window }
    }

    pub fn render(&self, content: DayContent<'_>) -> DayRender {
        DayRender {
            appointments: self.render_appointments(content.appointments),
            shadow_appointments: self.render_appointments(content.shadow_appointments),
            time_statuses: self.render_time_statuses(content.free_times, content.working_hours),
        }
    }

    /// Appointments on this date, clipped at the bottom only.
    pub fn render_appointments(&self, appointments: &[Appointment]) -> Vec<RenderedInterval<Appointment>> {
        let (from, to) = self.window.on(self.date);

        appointments
            .iter()
            .filter(|a| a.date() == Some(self.date))
            .filter_map(|a| {
                let start = a.start()?;
                let duration = a.duration()?;
                crop(rendered_interval(from, to, a.clone(), start, duration), true)
            })
            .collect()
    }

    pub fn render_time_statuses(
        &self,
        free_times: Option<&[FreeTime]>,
        working_hours: Option<&[WorkingHour]>,
    ) -> Vec<RenderedInterval<TimeStatus>> {
        let (from, to) = self.window.on(self.date);
        let mut statuses = Vec::new();
        let mut push = |status: TimeStatus, start: NaiveDateTime, duration: TimeDelta| {
            if let Some(ri) = crop(rendered_interval(from, to, status, start, duration), false) {
                statuses.push(ri);
            }
        };

        if let Some(free_times) = free_times {
            for free in free_times {
                push(TimeStatus::Free, free.from, free.duration());
            }

            let taken = invert_times(free_times, |f| f.from, |f| f.to_including_duration, from, to);
            for span in taken {
                push(TimeStatus::Taken, span.start, span.duration);
            }
        }

        if let Some(working_hours) = working_hours {
            let open: Vec<(NaiveDateTime, NaiveDateTime)> = working_hours
                .iter()
                .filter(|w| w.day_of_week() == self.date.weekday())
                .filter_map(|w| Some((self.date.and_time(w.time_from()?), self.date.and_time(w.time_to()?))))
                .collect();

            for span in invert_times(&open, |o| o.0, |o| o.1, from, to) {
                push(TimeStatus::Closed, span.start, span.duration);
            }
        }

        statuses
    }

    /// Vertical fraction of the window elapsed at `now`.
    ///
    /// Outside `[0, 1]` when `now` is not within the window on this date.
    pub fn current_time_offset(&self, now: NaiveDateTime) -> f64 {
        let (from, to) = self.window.on(self.date);
        let window = (to - from).num_milliseconds() as f64;
        if window <= 0.0 {
            return 0.0;
        }
        (now - from).num_milliseconds() as f64 / window
    }

    /// Time on this date at vertical fraction `fraction` of the window,
    /// rounded to the nearest five minutes.
    pub fn time_at_fraction(&self, fraction: f64) -> NaiveDateTime {
        let (from, to) = self.window.on(self.date);
        let offset = ((to - from).num_seconds() as f64 * fraction).floor() as i64;
        let time = from + TimeDelta::seconds(offset);

        let mut hours = time.hour();
        let mut minutes =
            ((time.minute() as f64 / CLICK_SNAP_MINUTES as f64).round() as u32) * CLICK_SNAP_MINUTES;
        if minutes >= 60 {
            hours += 1;
            minutes = 0;
        }

        // A 24th hour rolls over into the next day.
        self.date.and_time(NaiveTime::MIN)
            + TimeDelta::hours(hours as i64)
            + TimeDelta::minutes(minutes as i64)
    }
}

/// One hour cell of the grid's time column.
#[derive(Debug, Clone, PartialEq)]
pub struct HourRow {
    pub label: String,
    /// Time the cell starts at.
    pub start: NaiveTime,
    /// Hours the cell covers, divided by the number of cells. The heights
    /// only sum to 1 when every cell is a whole hour.
    pub height: f64,
}

impl HourRow {
    /// Where the cell starts, as a fraction of the window.
    pub fn offset(&self, window: &TimeWindow) -> f64 {
        let length = window.length().num_seconds();
        if length <= 0 {
            return 0.0;
        }
        (self.start - window.from).num_seconds() as f64 / length as f64
    }
}

/// Hour cells between `window.from` and `window.to`.
///
/// Partial first and last hours get proportionally shorter cells. Heights
/// are divided by the row count.
pub fn hour_rows(window: &TimeWindow) -> Vec<HourRow> {
    let label = |t: NaiveTime| t.format("%-H:%M").to_string();
    let on_the_hour = |hour: u32| NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);

    if window.from.hour() == window.to.hour() {
        return vec![HourRow {
            label: label(window.from),
            start: window.from,
            height: 1.0,
        }];
    }

    let mut rows = vec![HourRow {
        label: label(window.from),
        start: window.from,
        height: (60 - window.from.minute()) as f64 / 60.0,
    }];

    for hour in window.from.hour() + 1..window.to.hour() {
        rows.push(HourRow {
            label: format!("{hour}:00"),
            start: on_the_hour(hour),
            height: 1.0,
        });
    }

    if window.to.minute() > 0 {
        rows.push(HourRow {
            label: format!("{}:00", window.to.hour()),
            start: on_the_hour(window.to.hour()),
            height: window.to.minute() as f64 / 60.0,
        });
    }

    let count = rows.len() as f64;
    for row in &mut rows {
        row.height /= count;
    }
    rows
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;
    use crate::models::{Client, Service};

    fn date() -> NaiveDate {
        // A Monday.
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn appointment(id: i32, on: NaiveDate, h: u32, m: u32, minutes: i64) -> Appointment {
        Appointment::scheduled(
            id,
            on.and_time(t(h, m)),
            TimeDelta::minutes(minutes),
            Service::new(1, "Cut", TimeDelta::minutes(minutes)),
            Client::new(1, "Ana"),
        )
    }

    fn view(from: NaiveTime, to: NaiveTime) -> DayView {
        DayView::new(date(), TimeWindow::new(from, to))
    }

    #[test]
    fn default_window_when_nothing_is_scheduled() {
        let window = visible_time_window(&[CalendarDay::new(date(), vec![], vec![])], &[]);

        assert_eq!(window, TimeWindow::new(t(8, 0), t(14, 0)));
    }

    #[test]
    fn window_covers_days_and_shadow_appointments() {
        let day = CalendarDay::new(
            date(),
            vec![appointment(1, date(), 15, 0, 90)],
            vec![WorkingHour::new(1, Weekday::Mon, t(9, 0), t(16, 0))],
        );
        let shadow = vec![appointment(0, date(), 7, 30, 30)];

        let window = visible_time_window([&day], &shadow);

        assert_eq!(window, TimeWindow::new(t(7, 30), t(16, 30)));
    }

    #[test]
    fn appointments_of_other_dates_are_skipped() {
        let tomorrow = date().succ_opt().unwrap();
        let rendered = view(t(8, 0), t(20, 0)).render_appointments(&[
            appointment(1, date(), 9, 0, 60),
            appointment(2, tomorrow, 9, 0, 60),
        ]);

        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].value.id(), 1);
    }

    #[test]
    fn appointment_starting_early_keeps_negative_offset() {
        let rendered = view(t(8, 0), t(20, 0)).render_appointments(&[appointment(1, date(), 7, 0, 120)]);

        assert!(rendered[0].offset < 0.0);
    }

    #[test]
    fn free_times_produce_taken_complement() {
        let free = vec![FreeTime::new(date().and_time(t(10, 0)), date().and_time(t(12, 0)))];

        let statuses = view(t(8, 0), t(16, 0)).render_time_statuses(Some(free.as_slice()), None);
        let kinds: Vec<TimeStatus> = statuses.iter().map(|s| s.value).collect();

        assert_eq!(kinds, vec![TimeStatus::Free, TimeStatus::Taken, TimeStatus::Taken]);
        assert_eq!(statuses[1].start, date().and_time(t(8, 0)));
        assert_eq!(statuses[2].start, date().and_time(t(12, 0)));
    }

    #[test]
    fn closed_time_outside_working_hours() {
        let hours = vec![WorkingHour::new(1, Weekday::Mon, t(9, 0), t(17, 0))];

        let statuses = view(t(8, 0), t(18, 0)).render_time_statuses(None, Some(hours.as_slice()));

        assert_eq!(statuses.len(), 2);
        assert!(statuses.iter().all(|s| s.value == TimeStatus::Closed));
        assert_eq!(statuses[0].duration, TimeDelta::hours(1));
        assert_eq!(statuses[1].start, date().and_time(t(17, 0)));
    }

    #[test]
    fn no_working_hours_means_closed_all_day() {
        let hours: Vec<WorkingHour> = Vec::new();
        let statuses = view(t(8, 0), t(18, 0)).render_time_statuses(None, Some(hours.as_slice()));

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].height, 1.0);
    }

    #[test]
    fn hour_rows_with_partial_ends() {
        let rows = hour_rows(&TimeWindow::new(t(8, 30), t(11, 15)));

        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["8:30", "9:00", "10:00", "11:00"]);
        assert_eq!(rows[0].height, 0.5 / 4.0);
        assert_eq!(rows[1].height, 1.0 / 4.0);
        assert_eq!(rows[3].height, 0.25 / 4.0);
    }

    #[test]
    fn hour_row_offsets_follow_the_clock() {
        let window = TimeWindow::new(t(8, 30), t(11, 15));
        let offsets: Vec<f64> = hour_rows(&window).iter().map(|r| r.offset(&window)).collect();

        assert_eq!(offsets, vec![0.0, 30.0 / 165.0, 90.0 / 165.0, 150.0 / 165.0]);
    }

    #[test]
    fn hour_rows_within_a_single_hour() {
        let rows = hour_rows(&TimeWindow::new(t(9, 10), t(9, 50)));

        assert_eq!(rows, vec![HourRow { label: "9:10".into(), start: t(9, 10), height: 1.0 }]);
    }

    #[test]
    fn click_snaps_to_five_minutes() {
        let day = view(t(8, 0), t(10, 0));

        assert_eq!(day.time_at_fraction(0.5), date().and_time(t(9, 0)));
        // 08:00 + 0.1 * 2h = 08:12 -> 08:10
        assert_eq!(day.time_at_fraction(0.1), date().and_time(t(8, 10)));
    }

    #[test]
    fn click_rolls_over_the_hour() {
        let day = view(t(8, 0), t(10, 0));

        // 08:58 -> 09:00
        assert_eq!(day.time_at_fraction(0.49), date().and_time(t(9, 0)));
    }

    #[test]
    fn current_time_indicator_fraction() {
        let day = view(t(8, 0), t(12, 0));

        assert_eq!(day.current_time_offset(date().and_time(t(9, 0))), 0.25);
    }

    #[test]
    fn height_is_relative_to_eight_hours() {
        assert_eq!(TimeWindow::new(t(8, 0), t(12, 0)).height_vh(), 50.0);
    }
}
