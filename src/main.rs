use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dcca_map::config::AppConfig;
use dcca_map::controller::PageController;
use dcca_map::electors::ElectorsTable;
use dcca_map::types::GeoPoint;
use dcca_map::{data, server};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the map page state and boundary layers
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Find the constituencies containing a point in every loaded year
    Query {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Dataset to select before printing the info panel, e.g. DCCA_2019
        #[arg(short, long)]
        year: Option<String>,
    },
    /// List the configured boundary datasets
    Datasets {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn build_controller(config: &AppConfig) -> Result<PageController> {
    let datasets = data::load_datasets(config)?;
    let electors = ElectorsTable::load(&config.electors.csv, &config.features.code_property)?;
    let controller =
        PageController::initialize(Arc::new(datasets), Arc::new(electors), &config.map)?;
    Ok(controller)
}

fn load_config(path: &Path) -> Result<AppConfig> {
    tracing::info!("Using config: {:?}", path);
    AppConfig::load_from_file(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            let app_config = load_config(config)?;
            let controller = build_controller(&app_config)?;
            server::start_server(app_config, controller).await?;
        }
        Commands::Query {
            config,
            lng,
            lat,
            year,
        } => {
            let app_config = load_config(config)?;
            let mut controller = build_controller(&app_config)?;
            if let Some(name) = year {
                controller.on_year_toggle(name)?;
            }
            controller.on_map_clicked(GeoPoint::new(*lng, *lat));

            let snapshot = controller.snapshot();
            let matches = snapshot
                .state
                .selected_matches
                .as_ref()
                .ok_or_else(|| anyhow!("point was not resolved"))?;
            println!("{}", serde_json::to_string_pretty(matches)?);
            println!("{}", serde_json::to_string_pretty(&snapshot.info)?);
        }
        Commands::Datasets { config } => {
            let app_config = load_config(config)?;
            let controller = build_controller(&app_config)?;
            for dataset in controller.datasets() {
                let marker = if controller.is_checked(&dataset.name) { "*" } else { " " };
                println!(
                    "{} {} ({}): {} features",
                    marker,
                    dataset.name,
                    dataset.year(),
                    dataset.features.len()
                );
            }
        }
    }

    Ok(())
}
