mod commands;
mod render;
mod store;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use appy_core::config::AppyConfig;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use commands::clients::NewClient;
use commands::services::NewService;

#[derive(Parser)]
#[command(name = "appy")]
#[command(about = "Browse and book appointments from the terminal")]
struct Cli {
    /// Log datasource activity to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the day grid with appointments and closed hours
    Day {
        /// Date to show (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Number of consecutive days to show (default from config)
        #[arg(long)]
        days: Option<u32>,
    },
    /// List appointments page by page around a point in time
    Appointments {
        /// Cursor date/time (e.g., "2025-03-20T15:00", default now)
        #[arg(long)]
        from: Option<String>,

        /// Pages to load after the cursor
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Pages to load before the cursor
        #[arg(long, default_value_t = 0)]
        back: usize,
    },
    /// Book an appointment
    New {
        /// Client id (see `appy clients`)
        #[arg(long)]
        client: i32,

        /// Service id (see `appy services`)
        #[arg(long)]
        service: i32,

        /// Start date/time (e.g., "2025-03-20T15:00")
        #[arg(short, long)]
        start: String,

        /// Duration (e.g., "45m"), defaults to the service's
        #[arg(short, long)]
        duration: Option<String>,
    },
    /// Delete an appointment
    Delete { id: i32 },
    /// Show or replace the weekly working hours
    Hours {
        /// JSON file with the new schedule
        #[arg(long)]
        set: Option<PathBuf>,
    },
    /// List services, optionally adding one
    Services {
        /// Name of a service to add
        #[arg(long)]
        add: Option<String>,

        /// Duration of the added service (e.g., "30m")
        #[arg(short, long, requires = "add")]
        duration: Option<String>,

        /// Price of the added service
        #[arg(long, requires = "add")]
        price: Option<f64>,
    },
    /// List clients, optionally adding one
    Clients {
        /// Name of a client to add
        #[arg(long)]
        add: Option<String>,

        #[arg(long, requires = "add")]
        phone: Option<String>,

        #[arg(long, requires = "add")]
        email: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppyConfig::load()?;

    // Datasources spawn their fetches with spawn_local.
    LocalSet::new().run_until(run(cli.command, config)).await
}

async fn run(command: Commands, config: AppyConfig) -> Result<()> {
    match command {
        Commands::Day { date, days } => commands::day::run(&config, date, days).await,
        Commands::Appointments { from, pages, back } => {
            let from = from.as_deref().map(commands::parse_datetime).transpose()?;
            commands::appointments::run(&config, from, pages, back).await
        }
        Commands::New {
            client,
            service,
            start,
            duration,
        } => {
            let start = commands::parse_datetime(&start)?;
            let duration = duration.as_deref().map(commands::parse_duration).transpose()?;
            commands::new::run(&config, client, service, start, duration).await
        }
        Commands::Delete { id } => commands::delete::run(&config, id).await,
        Commands::Hours { set } => commands::hours::run(&config, set.as_deref()).await,
        Commands::Services {
            add,
            duration,
            price,
        } => {
            let duration = duration.as_deref().map(commands::parse_duration).transpose()?;
            let add = add.map(|name| NewService {
                name,
                duration,
                price,
            });
            commands::services::run(&config, add).await
        }
        Commands::Clients { add, phone, email } => {
            let add = add.map(|name| NewClient { name, phone, email });
            commands::clients::run(&config, add).await
        }
    }
}
