// PropVal - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Configurable values have a DEFAULT_ plus MIN_/MAX_ bounds used by the
// config.toml validator; fixed values have no bounds.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "PropVal";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "PropVal";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Dataset
// =============================================================================

/// Dataset file loaded when neither the CLI nor config.toml names one.
pub const DEFAULT_DATASET_FILE: &str = "dvf_light.csv";

/// A dataset needs a header line plus at least one data line.
pub const MIN_DATASET_LINES: usize = 2;

/// Delimiters considered during header sniffing, in tie-break order.
pub const DELIMITER_CANDIDATES: [u8; 3] = [b';', b',', b'|'];

/// Delimiter used when the header contains none of the candidates.
pub const FALLBACK_DELIMITER: u8 = b',';

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Qualifier appended to synthesised addresses that have no street name.
pub const PARTIAL_ADDRESS_MARKER: &str = "(adresse partielle)";

/// Address shown when a record carries no address fields at all.
pub const UNKNOWN_ADDRESS: &str = "-";

// =============================================================================
// Comparable matching
// =============================================================================

/// Default living-area tolerance (fraction either side of the subject).
pub const DEFAULT_SURFACE_TOLERANCE: f64 = 0.15;

/// Default land-area tolerance for house-like subjects.
pub const DEFAULT_LAND_TOLERANCE: f64 = 0.25;

/// Lower bound for either tolerance.
pub const MIN_TOLERANCE: f64 = 0.0;

/// Upper bound for either tolerance.
pub const MAX_TOLERANCE: f64 = 1.0;

/// Default recency cutoff (transactions strictly before are stale).
pub const DEFAULT_MIN_DATE: &str = "2023-01-01";

/// Room-count value standing for "this many rooms or more".
pub const ROOMS_OR_MORE: u32 = 6;

/// Smallest selectable room count.
pub const MIN_ROOM_SELECTION: u32 = 1;

/// Mean Earth radius used by the haversine distance.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default type label treated as house-like (land-area filter applies).
pub const DEFAULT_HOUSE_TYPE: &str = "Maison";

/// Default type label treated as apartment-like (lower price ceiling).
pub const DEFAULT_APARTMENT_TYPE: &str = "Appartement";

/// Default prefix shared by every commercial-premises type label.
pub const DEFAULT_COMMERCIAL_PREFIX: &str = "Local";

// =============================================================================
// Cleaning
// =============================================================================

/// Lowest plausible price per square metre. Not configurable.
pub const PRICE_PER_AREA_MIN: f64 = 800.0;

/// Highest plausible price per square metre. Not configurable.
pub const PRICE_PER_AREA_MAX: f64 = 12_000.0;

/// Default price ceiling for apartment-like transactions.
pub const DEFAULT_APARTMENT_PRICE_CEILING: f64 = 2_000_000.0;

/// Default price ceiling for every other transaction type.
pub const DEFAULT_HOUSE_PRICE_CEILING: f64 = 5_000_000.0;

/// Smallest accepted price ceiling in config.toml.
pub const MIN_PRICE_CEILING: f64 = 10_000.0;

/// Largest accepted price ceiling in config.toml.
pub const MAX_PRICE_CEILING: f64 = 1_000_000_000.0;

// =============================================================================
// Scoring & display
// =============================================================================

/// Weight of one room of difference in the similarity score.
pub const ROOM_PENALTY_PER_ROOM: f64 = 0.02;

/// Room differences beyond this are not penalised further.
pub const ROOM_PENALTY_MAX_DIFF: f64 = 4.0;

/// Weight of the (normalised) distance in the similarity score.
pub const DISTANCE_PENALTY_WEIGHT: f64 = 0.02;

/// Radius floor used when normalising distance, avoids division by ~0.
pub const MIN_SCORING_RADIUS_KM: f64 = 0.1;

/// Number of ranked comparables surfaced for display.
pub const DEFAULT_TOP_N: usize = 20;

/// Largest accepted `top_n` in config.toml.
pub const MAX_TOP_N: usize = 500;

/// Percentile used for the low estimate.
pub const LOW_PERCENTILE: f64 = 0.10;

/// Percentile used for the high estimate.
pub const HIGH_PERCENTILE: f64 = 0.90;

// =============================================================================
// Geocoding
// =============================================================================

/// Base Adresse Nationale search endpoint.
pub const DEFAULT_GEOCODER_ENDPOINT: &str = "https://api-adresse.data.gouv.fr/search/";

/// HTTP timeout for a geocoding call.
pub const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;

/// Bounds for `[geocoding] timeout_secs`.
pub const MIN_GEOCODER_TIMEOUT_SECS: u64 = 1;
pub const MAX_GEOCODER_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Export & files
// =============================================================================

/// Default log level when no override is present.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";
