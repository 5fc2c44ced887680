use anyhow::Result;
use appy_core::AppyError;
use appy_core::config::AppyConfig;
use appy_core::models::Appointment;
use appy_core::service::ModelService;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::store::JsonStore;

pub async fn run(config: &AppyConfig, id: i32) -> Result<()> {
    let store = JsonStore::<Appointment>::open(&config.data_path(), config.facility_id);
    let appointments = ModelService::new(store);

    let appointment = match appointments.get(&id).await {
        Ok(appointment) => appointment,
        Err(AppyError::NotFound(_)) => anyhow::bail!("Appointment #{id} not found"),
        Err(e) => return Err(e.into()),
    };

    appointments.delete(&id).await?;
    println!("{}", format!("  Deleted: {}", appointment.render()).red());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use appy_core::models::{Client, Service};
    use chrono::{NaiveDate, TimeDelta};

    #[tokio::test]
    async fn deletes_stored_appointment() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppyConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppyConfig::default()
        };
        let store = JsonStore::<Appointment>::open(dir.path(), config.facility_id);
        let start = NaiveDate::from_ymd_opt(2024, 3, 11)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut appointment = Appointment::scheduled(
            0,
            start,
            TimeDelta::minutes(30),
            Service::new(1, "Haircut", TimeDelta::minutes(30)),
            Client::new(1, "Ana"),
        );
        ModelService::new(store.clone())
            .add_new(&mut appointment)
            .await
            .unwrap();

        run(&config, 1).await.unwrap();

        assert!(store.read_all().unwrap().is_empty());
        assert!(run(&config, 1).await.unwrap_err().to_string().contains("#1 not found"));
    }
}
