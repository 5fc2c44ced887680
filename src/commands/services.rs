use anyhow::Result;
use appy_core::config::AppyConfig;
use appy_core::models::Service;
use appy_core::service::ModelService;
use appy_core::validation::Validate;
use chrono::TimeDelta;
use owo_colors::OwoColorize;

use super::{explain, first_snapshot};
use crate::render::{Render, render_validation_errors};
use crate::store::{JsonStore, Record};

/// Fields of a service to create.
pub struct NewService {
    pub name: String,
    pub duration: Option<TimeDelta>,
    pub price: Option<f64>,
}

pub async fn run(config: &AppyConfig, add: Option<NewService>) -> Result<()> {
    let store = JsonStore::<Service>::open(&config.data_path(), config.facility_id);
    let services = ModelService::new(store);

    if let Some(new) = add {
        let mut service = Service::default();
        service.set_name(new.name);
        service.set_duration(new.duration);
        service.set_price(new.price);

        if !service.validate() {
            anyhow::bail!(
                "Validation failed:\n{}",
                render_validation_errors(&service.broken_validations().first_errors())
            );
        }

        let created = services.add_new(&mut service).await.map_err(explain)?;
        println!("{}", format!("  Created: {}", created.render()).green());
    }

    let mut all = first_snapshot(services.get_all()).await?;
    all.sort_by(Service::compare);

    if all.is_empty() {
        println!("{}", "No services yet (use --add <name> --duration 30m)".dimmed());
        return Ok(());
    }

    for service in &all {
        println!("  {}", service.render());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    #[tokio::test]
    async fn added_service_is_listed_and_stored() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppyConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppyConfig::default()
        };
        let add = NewService {
            name: "Haircut".to_string(),
            duration: Some(TimeDelta::minutes(30)),
            price: Some(25.0),
        };

        LocalSet::new().run_until(run(&config, Some(add))).await.unwrap();

        let stored = JsonStore::<Service>::open(dir.path(), config.facility_id).read_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].duration(), Some(TimeDelta::minutes(30)));
    }

    #[tokio::test]
    async fn service_without_duration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppyConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppyConfig::default()
        };
        let add = NewService {
            name: "Massage".to_string(),
            duration: None,
            price: None,
        };

        let err = LocalSet::new()
            .run_until(run(&config, Some(add)))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("duration:"));
    }
}
