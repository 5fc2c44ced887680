use std::rc::Rc;

use anyhow::Result;
use appy_core::api::Params;
use appy_core::config::AppyConfig;
use appy_core::models::Appointment;
use appy_core::notify::Notification;
use appy_core::service::ModelService;
use chrono::{Local, NaiveDateTime};
use owo_colors::OwoColorize;

use crate::render::{Render, format_date_label};
use crate::store::JsonStore;

pub async fn run(
    config: &AppyConfig,
    from: Option<NaiveDateTime>,
    pages: usize,
    back: usize,
) -> Result<()> {
    let store = JsonStore::<Appointment>::open(&config.data_path(), config.facility_id);
    let service = ModelService::new(store).with_page_size(config.page_size);

    let now = Local::now().naive_local();
    let mut params = Params::new();
    params.insert("from".into(), serde_json::to_value(from.unwrap_or(now))?);

    let list = service.get_list_advanced(params, Rc::new(Appointment::chronological), None);
    let mut updates = list.subscribe();
    list.wait_idle().await;

    for _ in 1..pages {
        if list.is_reached_end_forwards() {
            break;
        }
        list.load_next_page();
        list.wait_idle().await;
    }
    for _ in 0..back {
        if list.is_reached_end_backwards() {
            break;
        }
        list.load_previous_page();
        list.wait_idle().await;
    }

    if let Some(Notification::Error(e)) = updates.latest() {
        return Err(e.into());
    }

    let appointments = list.snapshot();
    let more_after = !list.is_reached_end_forwards();
    let more_before = back > 0 && !list.is_reached_end_backwards();
    list.dispose();

    if appointments.is_empty() {
        println!("{}", "No appointments found".dimmed());
        return Ok(());
    }

    let mut current_date = None;
    for appointment in &appointments {
        let date = appointment.date();
        if date != current_date {
            if current_date.is_some() {
                println!();
            }
            if let Some(date) = date {
                println!("{}", format_date_label(date, now.date()).bold());
            }
            current_date = date;
        }
        println!("  {}", appointment.render());
    }

    if more_before || more_after {
        println!();
        if more_before {
            println!("{}", "  Earlier appointments exist (use --back)".dimmed());
        }
        if more_after {
            println!("{}", "  More appointments follow (use --pages)".dimmed());
        }
    }

    Ok(())
}
