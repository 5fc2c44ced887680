use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use appy_core::config::AppyConfig;
use appy_core::models::{WorkingHour, validate_schedule};
use appy_core::service::ModelService;
use owo_colors::OwoColorize;

use super::{explain, first_snapshot};
use crate::render::Render;
use crate::store::{JsonStore, Record};

pub async fn run(config: &AppyConfig, set: Option<&Path>) -> Result<()> {
    let store = JsonStore::<WorkingHour>::open(&config.data_path(), config.facility_id);

    if let Some(path) = set {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let schedule: Vec<WorkingHour> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid working hours in {}", path.display()))?;

        validate_schedule(&schedule).map_err(explain)?;
        let stored = store.replace_all(&schedule)?;
        println!("{}", format!("  Saved {} working hours", stored.len()).green());
    }

    let service = ModelService::new(store);
    let mut hours = first_snapshot(service.get_all()).await?;
    hours.sort_by(WorkingHour::compare);

    if hours.is_empty() {
        println!("{}", "No working hours set (use --set <file.json>)".dimmed());
        return Ok(());
    }

    for hour in &hours {
        println!("  {}", hour.render());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    fn config_in(dir: &Path) -> AppyConfig {
        AppyConfig {
            data_dir: dir.to_path_buf(),
            ..AppyConfig::default()
        }
    }

    #[tokio::test]
    async fn set_replaces_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hours.json");
        fs::write(
            &file,
            r#"[
                {"day_of_week": "Tue", "time_from": "09:00:00", "time_to": "17:00:00"},
                {"day_of_week": "Mon", "time_from": "08:00:00", "time_to": "12:00:00"}
            ]"#,
        )
        .unwrap();

        let config = config_in(dir.path());
        LocalSet::new()
            .run_until(run(&config, Some(file.as_path())))
            .await
            .unwrap();

        let stored = JsonStore::<WorkingHour>::open(dir.path(), config.facility_id)
            .read_all()
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].id(), 1);
    }

    #[tokio::test]
    async fn overlapping_schedule_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hours.json");
        fs::write(
            &file,
            r#"[
                {"day_of_week": "Mon", "time_from": "08:00:00", "time_to": "12:00:00"},
                {"day_of_week": "Mon", "time_from": "11:00:00", "time_to": "15:00:00"}
            ]"#,
        )
        .unwrap();

        let config = config_in(dir.path());
        let err = LocalSet::new()
            .run_until(run(&config, Some(file.as_path())))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("TIMES_OVERLAP"));
        let stored = JsonStore::<WorkingHour>::open(dir.path(), config.facility_id)
            .read_all()
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn schedule_belongs_to_the_configured_facility() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("hours.json");
        fs::write(
            &file,
            r#"[{"day_of_week": "Wed", "time_from": "10:00:00", "time_to": "18:00:00"}]"#,
        )
        .unwrap();
        let config = AppyConfig {
            facility_id: 2,
            ..config_in(dir.path())
        };

        LocalSet::new()
            .run_until(run(&config, Some(file.as_path())))
            .await
            .unwrap();

        let own = JsonStore::<WorkingHour>::open(dir.path(), 2).read_all().unwrap();
        let other = JsonStore::<WorkingHour>::open(dir.path(), 1).read_all().unwrap();
        assert_eq!(own.len(), 1);
        assert!(other.is_empty());
    }
}
