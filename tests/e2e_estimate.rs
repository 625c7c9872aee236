// PropVal - tests/e2e_estimate.rs
//
// End-to-end tests for the load -> request -> valuation pipeline.
//
// These tests read real dataset files from disk, go through the dataset
// store and the request session, and check the resulting comparables and
// estimate bands. Geocoding uses `FixedGeocoder`; nothing touches the
// network.

use chrono::NaiveDate;
use propval::app::geocode::FixedGeocoder;
use propval::app::request::EstimateRequest;
use propval::app::session::{Estimation, EstimationSession};
use propval::app::store::{self, DatasetStore, LoadState};
use propval::core::export;
use propval::core::model::{EstimationConfig, GeoPoint, TextEncoding};
use propval::platform::config;
use propval::util::error::{DataFormatError, RequestError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// Helpers
// =============================================================================

const SUBJECT: GeoPoint = GeoPoint {
    latitude: 48.8566,
    longitude: 2.3522,
};

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load `path` through the background loader and wait for it.
fn loaded_store(path: &Path) -> Arc<DatasetStore> {
    let store = Arc::new(DatasetStore::new());
    store::spawn_load(Arc::clone(&store), path.to_path_buf());
    match store.wait() {
        LoadState::Ready(_) => store,
        other => panic!("expected dataset to load, got {other:?}"),
    }
}

fn house_request(radius_km: f64) -> EstimateRequest {
    EstimateRequest {
        street: "1 rue de Rivoli".to_string(),
        postal_code: "75001".to_string(),
        city: "Paris".to_string(),
        property_type: "Maison".to_string(),
        living_area: 100.0,
        rooms: Vec::new(),
        land_area: None,
        radius_km,
    }
}

fn submit(store: Arc<DatasetStore>, config: EstimationConfig, request: EstimateRequest) -> Estimation {
    let session = EstimationSession::new(store, Arc::new(FixedGeocoder::new(SUBJECT)), config);
    session.submit(request).expect("request should be accepted")
}

/// Independent great-circle distance, for cross-checking.
fn reference_distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * 6371.0 * h.sqrt().asin()
}

fn write_temp(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

// =============================================================================
// Valuation E2E
// =============================================================================

/// One nearby recent house at 3000 €/m² gives four identical estimates.
#[test]
fn e2e_single_house_yields_exact_bands() {
    let store = loaded_store(&fixture("dvf_sample.csv"));
    let estimation = submit(store, EstimationConfig::default(), house_request(5.0));
    let outcome = estimation.outcome();
    let valuation = outcome.valuation().expect("one comparable expected");

    assert_eq!(valuation.result.count, 1);
    assert_eq!(valuation.comparables.len(), 1);
    assert_eq!(valuation.comparables[0].record.address, "12 RUE DE RIVOLI, 75001 Paris");

    let r = valuation.result;
    assert_eq!(r.median_price_per_area, 3000.0);
    assert_eq!(r.estimates.low, 300_000.0);
    assert_eq!(r.estimates.mean, 300_000.0);
    assert_eq!(r.estimates.median, 300_000.0);
    assert_eq!(r.estimates.high, 300_000.0);
}

/// A sale 50 km away is outside a 5 km radius but inside a 60 km one, at
/// the great-circle distance.
#[test]
fn e2e_radius_excludes_distant_record() {
    let store = loaded_store(&fixture("dvf_sample.csv"));

    let near = submit(Arc::clone(&store), EstimationConfig::default(), house_request(5.0));
    let near_outcome = near.outcome();
    let near_val = near_outcome.valuation().unwrap();
    assert!(near_val
        .comparables
        .iter()
        .all(|c| !c.record.address.contains("RUE DU NORD")));

    let wide = submit(store, EstimationConfig::default(), house_request(60.0));
    let wide_outcome = wide.outcome();
    let wide_val = wide_outcome.valuation().unwrap();
    assert_eq!(wide_val.comparables.len(), 2);

    let far = wide_val
        .comparables
        .iter()
        .find(|c| c.record.address.contains("RUE DU NORD"))
        .expect("distant sale should match at 60 km");
    let expected = reference_distance_km(SUBJECT, far.record.location().unwrap());
    assert!(expected > 49.0 && expected < 51.0, "fixture drifted: {expected}");
    assert!(
        (far.distance_km - expected).abs() / expected < 0.001,
        "distance {} vs reference {expected}",
        far.distance_km
    );

    // Closest, equally sized sale ranks first.
    assert!(wide_val.top()[0].record.address.contains("RIVOLI"));
}

/// An unparseable date never passes the recency filter, however early the
/// cutoff.
#[test]
fn e2e_unparseable_date_excluded() {
    let store = loaded_store(&fixture("dvf_sample.csv"));
    let permissive = EstimationConfig {
        min_date: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
        ..EstimationConfig::default()
    };

    let estimation = submit(store, permissive, house_request(5.0));
    let outcome = estimation.outcome();
    let valuation = outcome.valuation().unwrap();

    // The 2022 sale now qualifies; the undated one still does not.
    assert_eq!(valuation.comparables.len(), 2);
    assert!(valuation
        .comparables
        .iter()
        .all(|c| !c.record.address.contains("SANS DATE")));
}

/// A min_date from config.toml reaches the filter.
#[test]
fn e2e_config_min_date_applies() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_temp(&dir, "config.toml", b"[estimation]\nmin_date = \"2022-01-01\"\n");
    let (app_config, warnings) = config::load_config(&config_path);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

    let store = loaded_store(&fixture("dvf_sample.csv"));
    let estimation = submit(store, app_config.estimation, house_request(5.0));
    let outcome = estimation.outcome();
    assert_eq!(outcome.valuation().unwrap().comparables.len(), 2);
}

/// The "6 or more" choice matches an 8-room house.
#[test]
fn e2e_six_plus_rooms_matches_eight() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "rooms.csv",
        b"prix;type;surface_habitable;pieces;lat;lon;date\n\
          400000;Maison;100;8;48.8570;2.3530;2024-05-01\n\
          380000;Maison;100;3;48.8571;2.3531;2024-05-02\n",
    );
    let store = loaded_store(&path);

    let mut request = house_request(5.0);
    request.rooms = vec![6];
    let estimation = submit(store, EstimationConfig::default(), request);
    let outcome = estimation.outcome();
    let valuation = outcome.valuation().unwrap();

    assert_eq!(valuation.comparables.len(), 1);
    assert_eq!(valuation.comparables[0].record.room_count, Some(8));
}

/// Identical sales listed twice count once.
#[test]
fn e2e_duplicates_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "dups.csv",
        b"prix;type;surface_habitable;lat;lon;date;numero;voie;cp;commune\n\
          300000;Maison;100;48.8570;2.3530;2024-01-01;12;RUE A;75001;Paris\n\
          300000;Maison;100;48.8570;2.3530;2024-01-01;12;RUE A;75001;Paris\n\
          320000;Maison;100;48.8570;2.3530;2024-01-01;14;RUE A;75001;Paris\n",
    );
    let store = loaded_store(&path);
    let estimation = submit(store, EstimationConfig::default(), house_request(5.0));
    let outcome = estimation.outcome();

    let counts = outcome.counts();
    assert_eq!(counts.matched, 3);
    assert_eq!(counts.after_dedup, 2);
    assert_eq!(counts.after_clean, 2);
    assert_eq!(outcome.valuation().unwrap().result.count, 2);
}

/// No sale in range is an answer, not an error.
#[test]
fn e2e_no_comparables_is_outcome() {
    let store = loaded_store(&fixture("dvf_sample.csv"));
    let mut request = house_request(5.0);
    request.living_area = 400.0;
    let estimation = submit(store, EstimationConfig::default(), request);
    let outcome = estimation.outcome();
    assert!(outcome.valuation().is_none());
    assert_eq!(outcome.counts().matched, 0);
}

// =============================================================================
// Loading E2E
// =============================================================================

/// Accented, spaced headers and snake_case headers resolve to the same columns.
#[test]
fn e2e_header_aliases_resolve_identically() {
    let french = store::load_dataset(&fixture("dvf_sample.csv")).unwrap();
    let snake = store::load_dataset(&fixture("dvf_snake.csv")).unwrap();

    assert_eq!(french.delimiter, b';');
    assert_eq!(snake.delimiter, b',');
    // Blank line skipped, every other row kept in file order.
    assert_eq!(french.len(), 5);
    assert_eq!(french.records[4].property_type, "Appartement");

    let (a, b) = (&french.records[0], &snake.records[0]);
    assert_eq!(a.price, b.price);
    assert_eq!(a.property_type, b.property_type);
    assert_eq!(a.living_area, b.living_area);
    assert_eq!(a.room_count, b.room_count);
    assert_eq!(a.latitude, b.latitude);
    assert_eq!(a.longitude, b.longitude);
    assert_eq!(a.address, b.address);
    assert_eq!(a.date, b.date);
}

/// A BOM-less Windows-1252 file decodes headers and cells correctly.
#[test]
fn e2e_windows_1252_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "latin.csv",
        b"Valeur Fonci\xe8re;Type local;Surface r\xe9elle b\xe2ti;Latitude;Longitude;Date mutation;Nom commune\n\
          150000;Maison;90;45.4397;4.3872;2024-02-01;Saint-\xc9tienne\n",
    );
    let dataset = store::load_dataset(&path).unwrap();

    assert_eq!(dataset.encoding, TextEncoding::Windows1252);
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.records[0].price, Some(150_000.0));
    assert!(dataset.records[0].address.ends_with("Saint-\u{c9}tienne"));
}

/// Missing required columns are all named in one error.
#[test]
fn e2e_missing_columns_fails_load() {
    let store = Arc::new(DatasetStore::new());
    store::spawn_load(Arc::clone(&store), fixture("missing_columns.csv"));
    match store.wait() {
        LoadState::Failed(msg) => {
            assert!(msg.contains("latitude"), "message: {msg}");
            assert!(msg.contains("longitude"), "message: {msg}");
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    match store::load_dataset(&fixture("missing_columns.csv")) {
        Err(DataFormatError::MissingColumns { missing }) => {
            assert_eq!(missing, vec!["latitude", "longitude"]);
        }
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}

/// A header with no data rows is malformed.
#[test]
fn e2e_header_only_is_too_short() {
    assert!(matches!(
        store::load_dataset(&fixture("header_only.csv")),
        Err(DataFormatError::TooFewLines { lines: 1, min: 2 })
    ));
}

// =============================================================================
// Request boundary E2E
// =============================================================================

/// Requests before the load completes are declined.
#[test]
fn e2e_not_ready_before_load() {
    let session = EstimationSession::new(
        Arc::new(DatasetStore::new()),
        Arc::new(FixedGeocoder::new(SUBJECT)),
        EstimationConfig::default(),
    );
    assert!(matches!(session.submit(house_request(5.0)), Err(RequestError::NotReady)));
}

/// An unknown address is a per-request error; the session keeps working.
#[test]
fn e2e_address_not_found() {
    let store = loaded_store(&fixture("dvf_sample.csv"));
    let lost = EstimationSession::new(
        Arc::clone(&store),
        Arc::new(FixedGeocoder::not_found()),
        EstimationConfig::default(),
    );
    assert!(matches!(
        lost.submit(house_request(5.0)),
        Err(RequestError::AddressNotFound { .. })
    ));

    let found = submit(store, EstimationConfig::default(), house_request(5.0));
    assert!(found.outcome().valuation().is_some());
}

/// Ranked comparables export to JSON on disk.
#[test]
fn e2e_export_json() {
    let store = loaded_store(&fixture("dvf_sample.csv"));
    let estimation = submit(store, EstimationConfig::default(), house_request(60.0));
    let outcome = estimation.outcome();
    let valuation = outcome.valuation().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("comps.json");
    let file = std::fs::File::create(&dest).unwrap();
    let written = export::export_json(&valuation.comparables, file, &dest).unwrap();
    assert_eq!(written, 2);

    let value: serde_json::Value = serde_json::from_slice(&std::fs::read(&dest).unwrap()).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);
    assert_eq!(value[0]["address"], "12 RUE DE RIVOLI, 75001 Paris");
}
