use anyhow::Result;
use appy_core::AppyError;
use appy_core::config::AppyConfig;
use appy_core::day_view::{DayContent, DayView, visible_time_window};
use appy_core::models::{CalendarDay, Facility};
use appy_core::service::ModelService;
use appy_core::smart_cache::DateSmartCaching;
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;

use crate::render::{format_date_label, render_day_grid};
use crate::store::{self, JsonStore};
use crate::utils::tui::create_spinner;

pub async fn run(config: &AppyConfig, date: Option<NaiveDate>, days: Option<u32>) -> Result<()> {
    let now = Local::now().naive_local();
    let date = date.unwrap_or(now.date());
    let days = days.unwrap_or(config.days_to_show);

    let dir = config.data_path();
    let facilities = ModelService::new(JsonStore::<Facility>::open(&dir, config.facility_id));
    let facility = match facilities.get(&config.facility_id).await {
        Ok(facility) => Some(facility),
        Err(AppyError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    let cache = DateSmartCaching::new(store::day_loader(&dir, config.facility_id), days);
    let spinner = create_spinner("Loading calendar".to_string());
    cache.load(date);
    cache.wait_for_visible().await;
    spinner.finish_and_clear();

    let visible = cache.visible();
    cache.dispose();

    let failed: Vec<String> = visible
        .iter()
        .filter(|entry| entry.data.is_none())
        .map(|entry| entry.date.to_string())
        .collect();
    if !failed.is_empty() {
        anyhow::bail!("Could not load {}", failed.join(", "));
    }

    let shown: Vec<&CalendarDay> = visible.iter().filter_map(|entry| entry.data.as_ref()).collect();
    let window = visible_time_window(shown.iter().copied(), &[]);

    if let Some(facility) = facility {
        println!("{}", facility.name().bold().underline());
        println!();
    }

    for (i, (entry, day)) in visible.iter().zip(&shown).enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", format_date_label(entry.date, now.date()).bold());

        let view = DayView::new(entry.date, window);
        let render = view.render(DayContent {
            appointments: &day.appointments,
            working_hours: Some(day.working_hours.as_slice()),
            ..Default::default()
        });

        for line in render_day_grid(&view, &render, config.rows_per_hour, Some(now)) {
            println!("{line}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    fn config_in(dir: &std::path::Path) -> AppyConfig {
        AppyConfig {
            data_dir: dir.to_path_buf(),
            ..AppyConfig::default()
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
    }

    #[tokio::test]
    async fn unknown_facility_only_drops_the_header() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        LocalSet::new()
            .run_until(run(&config, Some(monday()), Some(1)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unreadable_facility_list_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("facilities.json"), "not json").unwrap();
        let config = config_in(dir.path());

        let result = LocalSet::new()
            .run_until(run(&config, Some(monday()), Some(1)))
            .await;

        assert!(result.is_err());
    }
}
