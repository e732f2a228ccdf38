mod plan;
mod registry;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use farmalog_core::Coordinate;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "farmalog-cli")]
#[command(about = "Farmalog operator command line interface")]
struct Cli {
    /// Point-of-sale CSV export
    #[arg(
        long,
        global = true,
        env = "FARMALOG_REGISTRY_PATH",
        default_value = "./data/direccion_pdv.csv"
    )]
    registry: PathBuf,
    /// Column mapping YAML
    #[arg(
        long,
        global = true,
        env = "FARMALOG_COLUMNS_PATH",
        default_value = "./config/columns.yaml"
    )]
    columns: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load the registry and report record counts per area
    Check,
    /// List points of sale within a radius of a hub
    Nearby {
        /// Origin hub name
        #[arg(long)]
        origin: String,
        /// Area label (e.g., "Guayas - Guayaquil"); defaults to the first area
        #[arg(long)]
        area: Option<String>,
        /// Search radius in kilometers
        #[arg(long, default_value = "5")]
        radius_km: f64,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Request a driving route and print its distance summary
    Route {
        /// Origin hub name
        #[arg(long)]
        origin: String,
        /// Transfer stop name; repeat for a second stop
        #[arg(long = "transfer")]
        transfers: Vec<String>,
        /// Customer position as "lat,lng"
        #[arg(
            long,
            value_parser = parse_coordinate,
            allow_hyphen_values = true,
            conflicts_with = "address",
            required_unless_present = "address"
        )]
        to: Option<Coordinate>,
        /// Customer address, resolved through autocomplete
        #[arg(long)]
        address: Option<String>,
    },
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got \"{raw}\""))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude \"{lat}\": {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude \"{lng}\": {e}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("coordinate out of range: {lat},{lng}"));
    }
    Ok(Coordinate::new(lat, lng))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let log_level = std::env::var("FARMALOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("farmalog-cli ready; see --help for commands");
        return Ok(());
    };

    let registry = registry::load(&cli.registry, &cli.columns)?;
    match command {
        Commands::Check => registry::run_check(&registry),
        Commands::Nearby {
            origin,
            area,
            radius_km,
            json,
        } => registry::run_nearby(&registry, &origin, area.as_deref(), radius_km, json),
        Commands::Route {
            origin,
            transfers,
            to,
            address,
        } => plan::run_route(&registry, &origin, &transfers, to, address.as_deref()).await,
    }
}
