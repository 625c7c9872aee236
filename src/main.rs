// PropVal - main.rs
//
// Command-line front end. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation (debug mode support)
// 3. Background dataset load, waiting for the ready state
// 4. One estimation request, text report, optional export

use clap::Parser;
use propval::app::geocode::{BanGeocoder, FixedGeocoder, Geocoder};
use propval::app::report::Report;
use propval::app::request::EstimateRequest;
use propval::app::session::EstimationSession;
use propval::app::store::{self, DatasetStore, LoadState};
use propval::core::model::GeoPoint;
use propval::platform::{self, config::PlatformPaths};
use propval::util;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Exit status when the dataset cannot be loaded.
const EXIT_LOAD_FAILED: i32 = 1;
/// Exit status when the request is rejected or the export fails.
const EXIT_REQUEST_FAILED: i32 = 2;

/// PropVal - estimate a property's market value from comparable sales.
///
/// Loads a DVF-style transaction file, selects comparable sales around the
/// given address and prints a price range.
#[derive(Parser, Debug)]
#[command(name = "propval", version, about)]
struct Cli {
    /// Transaction dataset (CSV). Defaults to config, then dvf_light.csv.
    #[arg(long = "data")]
    data: Option<PathBuf>,

    /// Alternative config.toml.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Property type as written in the dataset (e.g. Maison, Appartement).
    #[arg(short = 't', long = "type")]
    property_type: String,

    /// Living area in m².
    #[arg(short = 's', long = "surface")]
    surface: f64,

    /// Street number and name.
    #[arg(short = 'a', long = "address")]
    street: String,

    #[arg(long = "postal-code")]
    postal_code: String,

    #[arg(long = "city")]
    city: String,

    /// Room counts to match (1-6, 6 meaning 6 or more). Repeat or comma-separate.
    #[arg(short = 'r', long = "rooms", value_delimiter = ',')]
    rooms: Vec<u32>,

    /// Land area in m² (houses only).
    #[arg(long = "land")]
    land: Option<f64>,

    /// Search radius in km.
    #[arg(long = "radius", default_value_t = 1.0)]
    radius: f64,

    /// Known latitude; skips the geocoding service.
    #[arg(long = "lat", requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Known longitude; skips the geocoding service.
    #[arg(long = "lon", requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Write the ranked comparables to this file (.json for JSON, otherwise CSV).
    #[arg(short = 'o', long = "export")]
    export: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Config first: it carries the log level and file.
    let platform_paths = PlatformPaths::resolve();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| platform_paths.config_file());
    let (config, warnings) = platform::config::load_config(&config_path);

    util::logging::init(cli.debug, config.log_level.as_deref(), config.log_file.as_deref());
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "PropVal starting"
    );

    let dataset_path = platform::fs::resolve_dataset_path(
        cli.data.as_deref(),
        config.dataset_path.as_deref(),
        &platform_paths.data_dir,
    );

    let dataset_store = Arc::new(DatasetStore::new());
    store::spawn_load(Arc::clone(&dataset_store), dataset_path);
    match dataset_store.wait() {
        LoadState::Ready(dataset) => {
            eprintln!("Data ready: {} rows", dataset.len());
        }
        LoadState::Failed(msg) => {
            eprintln!("Error: could not load transaction data: {msg}");
            std::process::exit(EXIT_LOAD_FAILED);
        }
        LoadState::Pending => {
            eprintln!("Error: transaction data load did not complete");
            std::process::exit(EXIT_LOAD_FAILED);
        }
    }

    let geocoder: Arc<dyn Geocoder> = match (cli.lat, cli.lon) {
        (Some(latitude), Some(longitude)) => Arc::new(FixedGeocoder::new(GeoPoint {
            latitude,
            longitude,
        })),
        _ => match BanGeocoder::new(
            config.geocoder_endpoint.clone(),
            Duration::from_secs(config.geocoder_timeout_secs),
        ) {
            Ok(g) => Arc::new(g),
            Err(e) => {
                eprintln!("Error: cannot initialise geocoder: {e}");
                std::process::exit(EXIT_REQUEST_FAILED);
            }
        },
    };

    let session = EstimationSession::new(dataset_store, geocoder, config.estimation);
    let request = EstimateRequest {
        street: cli.street,
        postal_code: cli.postal_code,
        city: cli.city,
        property_type: cli.property_type,
        living_area: cli.surface,
        rooms: cli.rooms,
        land_area: cli.land,
        radius_km: cli.radius,
    };

    let estimation = match session.submit(request) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_REQUEST_FAILED);
        }
    };

    tracing::info!(
        rows = estimation.dataset().len(),
        "Searching transactions for comparables"
    );
    let outcome = estimation.outcome();
    print!(
        "{}",
        Report {
            subject: estimation.subject(),
            config: estimation.config(),
            outcome: &outcome,
        }
    );

    if let Some(ref dest) = cli.export {
        let Some(valuation) = outcome.valuation() else {
            eprintln!("Nothing to export: no comparable sales found.");
            return;
        };
        match platform::fs::write_export(&valuation.comparables, dest) {
            Ok(n) => eprintln!("Exported {n} comparables to {}", dest.display()),
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Error: {e}");
                std::process::exit(EXIT_REQUEST_FAILED);
            }
        }
    }
}

