use anyhow::Result;
use appy_core::config::AppyConfig;
use appy_core::models::Client;
use appy_core::service::ModelService;
use appy_core::validation::Validate;
use owo_colors::OwoColorize;

use super::{explain, first_snapshot};
use crate::render::{Render, render_validation_errors};
use crate::store::{JsonStore, Record};

/// Fields of a client to create.
pub struct NewClient {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

pub async fn run(config: &AppyConfig, add: Option<NewClient>) -> Result<()> {
    let store = JsonStore::<Client>::open(&config.data_path(), config.facility_id);
    let clients = ModelService::new(store);

    if let Some(new) = add {
        let mut client = Client::default();
        client.set_name(new.name);
        client.set_phone(new.phone);
        client.set_email(new.email);

        if !client.validate() {
            anyhow::bail!(
                "Validation failed:\n{}",
                render_validation_errors(&client.broken_validations().first_errors())
            );
        }

        let created = clients.add_new(&mut client).await.map_err(explain)?;
        println!("{}", format!("  Created: {}", created.render()).green());
    }

    let mut all = first_snapshot(clients.get_all()).await?;
    all.sort_by(Client::compare);

    if all.is_empty() {
        println!("{}", "No clients yet (use --add <name>)".dimmed());
        return Ok(());
    }

    for client in &all {
        println!("  {}", client.render());
    }

    Ok(())
}
