use anyhow::{Context, Result};
use appy_core::config::AppyConfig;
use appy_core::models::{Appointment, Client, Service};
use appy_core::service::ModelService;
use appy_core::validation::Validate;
use chrono::{NaiveDateTime, TimeDelta};
use owo_colors::OwoColorize;

use super::explain;
use crate::render::{Render, render_validation_errors};
use crate::store::JsonStore;

pub async fn run(
    config: &AppyConfig,
    client_id: i32,
    service_id: i32,
    start: NaiveDateTime,
    duration: Option<TimeDelta>,
) -> Result<()> {
    let dir = config.data_path();
    let services = ModelService::new(JsonStore::<Service>::open(&dir, config.facility_id));
    let clients = ModelService::new(JsonStore::<Client>::open(&dir, config.facility_id));
    let appointments = ModelService::new(JsonStore::<Appointment>::open(&dir, config.facility_id));

    let service = services
        .get(&service_id)
        .await
        .with_context(|| format!("Service #{service_id} not found (see `appy services`)"))?;
    let client = clients
        .get(&client_id)
        .await
        .with_context(|| format!("Client #{client_id} not found (see `appy clients`)"))?;

    let mut appointment = build(start, duration, service, client);
    if !appointment.validate() {
        anyhow::bail!(
            "Validation failed:\n{}",
            render_validation_errors(&appointment.broken_validations().first_errors())
        );
    }

    let created = appointments
        .add_new(&mut appointment)
        .await
        .map_err(explain)?;

    println!("{}", format!("  Created: {}", created.render()).green());

    Ok(())
}

/// An explicit duration wins over the service's default.
fn build(
    start: NaiveDateTime,
    duration: Option<TimeDelta>,
    service: Service,
    client: Client,
) -> Appointment {
    let mut appointment = Appointment::new();
    appointment.set_date(Some(start.date()));
    appointment.set_time(Some(start.time()));
    if duration.is_some() {
        appointment.set_duration(duration);
    }
    appointment.set_service(Some(service));
    appointment.set_client(Some(client));
    appointment
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn nine_am() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 11)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn haircut() -> Service {
        Service::new(1, "Haircut", TimeDelta::minutes(30))
    }

    #[test]
    fn duration_defaults_to_service() {
        let mut appointment = build(nine_am(), None, haircut(), Client::new(1, "Ana"));

        assert!(appointment.validate());
        assert_eq!(appointment.duration(), Some(TimeDelta::minutes(30)));
        assert_eq!(appointment.start(), Some(nine_am()));
    }

    #[test]
    fn explicit_duration_wins() {
        let appointment = build(
            nine_am(),
            Some(TimeDelta::minutes(45)),
            haircut(),
            Client::new(1, "Ana"),
        );

        assert_eq!(appointment.end(), Some(nine_am() + TimeDelta::minutes(45)));
    }

    #[tokio::test]
    async fn created_appointment_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppyConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppyConfig::default()
        };
        let mut service = haircut();
        let mut client = Client::new(0, "Ana");
        ModelService::new(JsonStore::<Service>::open(dir.path(), config.facility_id))
            .add_new(&mut service)
            .await
            .unwrap();
        ModelService::new(JsonStore::<Client>::open(dir.path(), config.facility_id))
            .add_new(&mut client)
            .await
            .unwrap();

        run(&config, 1, 1, nine_am(), None).await.unwrap();

        let stored = JsonStore::<Appointment>::open(dir.path(), config.facility_id)
            .read_all()
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].client().map(Client::name), Some("Ana"));
    }

    #[tokio::test]
    async fn unknown_service_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppyConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppyConfig::default()
        };

        let err = run(&config, 1, 9, nine_am(), None).await.unwrap_err();

        assert!(err.to_string().contains("Service #9"));
    }
}
