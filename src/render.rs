//! Terminal rendering for appy types.
//!
//! Extension traits adding colored output to appy-core types using
//! owo_colors, and the text grid drawn by `appy day`.

use std::collections::BTreeMap;

use appy_core::day_view::{DayRender, DayView, TimeStatus, hour_rows};
use appy_core::models::{Appointment, Client, Service, WorkingHour};
use chrono::{NaiveDate, NaiveDateTime};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

fn client_name(appointment: &Appointment) -> &str {
    appointment.client().map(Client::name).unwrap_or("(no client)")
}

fn service_name(appointment: &Appointment) -> &str {
    appointment.service().map(Service::name).unwrap_or("(no service)")
}

impl Render for Appointment {
    fn render(&self) -> String {
        let time = match (self.start(), self.end()) {
            (Some(start), Some(end)) => {
                format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
            }
            _ => "--:-----:--".to_string(),
        };
        let id = format!("#{}", self.id());

        format!(
            "{} {} {} {}",
            time,
            client_name(self).bold(),
            service_name(self),
            id.dimmed()
        )
    }
}

impl Render for WorkingHour {
    fn render(&self) -> String {
        let time = |t: Option<chrono::NaiveTime>| {
            t.map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string())
        };
        format!(
            "{} {}-{}",
            self.day_of_week().to_string().bold(),
            time(self.time_from()),
            time(self.time_to())
        )
    }
}

impl Render for Service {
    fn render(&self) -> String {
        let duration = self
            .duration()
            .map(|d| format!("{}m", d.num_minutes()))
            .unwrap_or_default();
        let price = self.price().map(|p| format!("{p:.2}")).unwrap_or_default();
        let id = format!("#{}", self.id());

        format!("{} {} {} {}", id.dimmed(), self.name().bold(), duration, price.dimmed())
    }
}

impl Render for Client {
    fn render(&self) -> String {
        let contact: Vec<&str> = [self.phone(), self.email()].into_iter().flatten().collect();
        let id = format!("#{}", self.id());

        format!("{} {} {}", id.dimmed(), self.name().bold(), contact.join(", ").dimmed())
    }
}

impl Render for TimeStatus {
    fn render(&self) -> String {
        match self {
            TimeStatus::Free => "·".green().to_string(),
            TimeStatus::Taken => "▒".yellow().to_string(),
            TimeStatus::Closed => "░".dimmed().to_string(),
        }
    }
}

/// Validation errors as one line per property.
pub fn render_validation_errors(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(property, code)| format!("  {} {}", format!("{property}:").bold(), code.red()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Mon Mar 11")
pub fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        -1 => "Yesterday".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Grid row index of every hour label.
fn label_rows(view: &DayView, total: usize) -> BTreeMap<usize, String> {
    let mut labels = BTreeMap::new();
    for row in hour_rows(&view.window) {
        let index = (row.offset(&view.window) * total as f64).round() as usize;
        if index < total {
            labels.entry(index).or_insert(row.label);
        }
    }
    labels
}

/// The day as text rows: an hour column and one cell per row.
///
/// Each row covers `1 / rows_per_hour` of an hour. A row shows whatever
/// covers its midpoint: an appointment (labelled on its first row), else
/// the time status, else blank.
pub fn render_day_grid(
    view: &DayView,
    day: &DayRender,
    rows_per_hour: u32,
    now: Option<NaiveDateTime>,
) -> Vec<String> {
    let minutes = view.window.length().num_minutes().max(0);
    let per_hour = i64::from(rows_per_hour.max(1));
    let total = ((minutes * per_hour + 59) / 60).max(1) as usize;

    let labels = label_rows(view, total);
    let now_row = now
        .map(|now| view.current_time_offset(now))
        .filter(|offset| (0.0..1.0).contains(offset))
        .map(|offset| (offset * total as f64) as usize);

    let mut labelled: Vec<i32> = Vec::new();
    let mut lines = Vec::with_capacity(total);

    for row in 0..total {
        let mid = (row as f64 + 0.5) / total as f64;
        let covers = |offset: f64, height: f64| offset <= mid && mid < offset + height;

        let cell = match day
            .appointments
            .iter()
            .find(|a| covers(a.offset, a.height))
        {
            Some(a) if !labelled.contains(&a.value.id()) => {
                labelled.push(a.value.id());
                let text = format!(
                    "█ {} {} {}",
                    a.start.format("%H:%M"),
                    client_name(&a.value),
                    service_name(&a.value)
                );
                text.cyan().to_string()
            }
            Some(_) => "█".cyan().to_string(),
            None => day
                .time_statuses
                .iter()
                .rev()
                .find(|s| covers(s.offset, s.height))
                .map(|s| s.value.render().repeat(3))
                .unwrap_or_default(),
        };

        let label = labels.get(&row).map(String::as_str).unwrap_or("");
        let marker = if now_row == Some(row) {
            format!(" {}", "◀ now".red())
        } else {
            String::new()
        };

        lines.push(format!("{:>6} │ {}{}", label.dimmed(), cell, marker));
    }

    lines
}
