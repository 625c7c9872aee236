// PropVal - platform/config.rs
//
// Platform-specific configuration, data directory resolution, and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::model::EstimationConfig;
use crate::util::constants;
use crate::util::error::ConfigError;
use chrono::NaiveDate;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for PropVal configuration and data.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/propval/ or %APPDATA%\PropVal\config\)
    pub config_dir: PathBuf,

    /// Data directory, searched for the dataset when no path is given.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[dataset]` section.
    pub dataset: DatasetSection,
    /// `[estimation]` section.
    pub estimation: EstimationSection,
    /// `[geocoding]` section.
    pub geocoding: GeocodingSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[dataset]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DatasetSection {
    /// Path of the transaction file loaded at startup.
    pub path: Option<String>,
}

/// `[estimation]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct EstimationSection {
    pub surface_tolerance: Option<f64>,
    pub land_tolerance: Option<f64>,
    /// Recency cutoff, `YYYY-MM-DD`.
    pub min_date: Option<String>,
    pub apartment_price_ceiling: Option<f64>,
    pub house_price_ceiling: Option<f64>,
    pub top_n: Option<usize>,
    pub house_type: Option<String>,
    pub apartment_type: Option<String>,
    pub commercial_prefix: Option<String>,
}

/// `[geocoding]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct GeocodingSection {
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Dataset path from config (the CLI may override it).
    pub dataset_path: Option<PathBuf>,

    /// Tolerances, ceilings and type labels for the valuation pipeline.
    pub estimation: EstimationConfig,

    pub geocoder_endpoint: String,
    pub geocoder_timeout_secs: u64,

    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// Log file path.
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            estimation: EstimationConfig::default(),
            geocoder_endpoint: constants::DEFAULT_GEOCODER_ENDPOINT.to_string(),
            geocoder_timeout_secs: constants::DEFAULT_GEOCODER_TIMEOUT_SECS,
            log_level: None,
            log_file: None,
        }
    }
}

/// Load and validate a config file.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unreadable or unparseable, returns defaults with a warning.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path.to_path_buf(),
                source,
            };
            return fall_back_to_defaults(err);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: config_path.to_path_buf(),
                source,
            };
            return fall_back_to_defaults(err);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    validate(raw)
}

fn fall_back_to_defaults(err: ConfigError) -> (AppConfig, Vec<String>) {
    tracing::warn!(error = %err, "Config file ignored");
    (AppConfig::default(), vec![format!("{err}. Using defaults.")])
}

/// Validate each raw field against named constants, accumulating warnings.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings: Vec<String> = Vec::new();

    // -- Dataset --
    if let Some(path) = raw.dataset.path.filter(|p| !p.trim().is_empty()) {
        config.dataset_path = Some(PathBuf::from(path));
    }

    // -- Estimation: tolerances --
    let est = &mut config.estimation;
    if let Some(tol) = raw.estimation.surface_tolerance {
        if tolerance_in_range(tol) {
            est.surface_tolerance = tol;
        } else {
            warnings.push(tolerance_warning(
                "surface_tolerance",
                tol,
                constants::DEFAULT_SURFACE_TOLERANCE,
            ));
        }
    }
    if let Some(tol) = raw.estimation.land_tolerance {
        if tolerance_in_range(tol) {
            est.land_tolerance = tol;
        } else {
            warnings.push(tolerance_warning(
                "land_tolerance",
                tol,
                constants::DEFAULT_LAND_TOLERANCE,
            ));
        }
    }

    // -- Estimation: min_date --
    if let Some(ref date) = raw.estimation.min_date {
        match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
            Ok(d) => est.min_date = d,
            Err(_) => warnings.push(range_warning(
                "estimation.min_date",
                date,
                "a YYYY-MM-DD date",
                constants::DEFAULT_MIN_DATE,
            )),
        }
    }

    // -- Estimation: price ceilings --
    if let Some(ceiling) = raw.estimation.apartment_price_ceiling {
        if ceiling_in_range(ceiling) {
            est.apartment_price_ceiling = ceiling;
        } else {
            warnings.push(ceiling_warning(
                "apartment_price_ceiling",
                ceiling,
                constants::DEFAULT_APARTMENT_PRICE_CEILING,
            ));
        }
    }
    if let Some(ceiling) = raw.estimation.house_price_ceiling {
        if ceiling_in_range(ceiling) {
            est.house_price_ceiling = ceiling;
        } else {
            warnings.push(ceiling_warning(
                "house_price_ceiling",
                ceiling,
                constants::DEFAULT_HOUSE_PRICE_CEILING,
            ));
        }
    }

    // -- Estimation: top_n --
    if let Some(n) = raw.estimation.top_n {
        if (1..=constants::MAX_TOP_N).contains(&n) {
            est.top_n = n;
        } else {
            warnings.push(range_warning(
                "estimation.top_n",
                n,
                &format!("1-{}", constants::MAX_TOP_N),
                constants::DEFAULT_TOP_N,
            ));
        }
    }

    // -- Estimation: type labels --
    for (field, value, target) in [
        ("house_type", raw.estimation.house_type, &mut est.house_type),
        ("apartment_type", raw.estimation.apartment_type, &mut est.apartment_type),
        ("commercial_prefix", raw.estimation.commercial_prefix, &mut est.commercial_prefix),
    ] {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => *target = v,
            Some(v) => warnings.push(range_warning(
                &format!("estimation.{field}"),
                v,
                "a non-empty label",
                &*target,
            )),
            None => {}
        }
    }

    // -- Geocoding --
    if let Some(endpoint) = raw.geocoding.endpoint {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            config.geocoder_endpoint = endpoint;
        } else {
            warnings.push(range_warning(
                "geocoding.endpoint",
                &endpoint,
                "an http:// or https:// URL",
                constants::DEFAULT_GEOCODER_ENDPOINT,
            ));
        }
    }
    if let Some(secs) = raw.geocoding.timeout_secs {
        if (constants::MIN_GEOCODER_TIMEOUT_SECS..=constants::MAX_GEOCODER_TIMEOUT_SECS).contains(&secs) {
            config.geocoder_timeout_secs = secs;
        } else {
            warnings.push(range_warning(
                "geocoding.timeout_secs",
                secs,
                &format!(
                    "{}-{}",
                    constants::MIN_GEOCODER_TIMEOUT_SECS,
                    constants::MAX_GEOCODER_TIMEOUT_SECS,
                ),
                constants::DEFAULT_GEOCODER_TIMEOUT_SECS,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(range_warning(
                "logging.level",
                level,
                "one of error, warn, info, debug, trace",
                "info",
            ));
        }
    }

    // -- Logging: file --
    if let Some(ref file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(file.clone());
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

fn tolerance_in_range(tol: f64) -> bool {
    (constants::MIN_TOLERANCE..=constants::MAX_TOLERANCE).contains(&tol)
}

fn tolerance_warning(field: &str, value: f64, default: f64) -> String {
    range_warning(
        &format!("estimation.{field}"),
        value,
        &format!("{}-{}", constants::MIN_TOLERANCE, constants::MAX_TOLERANCE),
        default,
    )
}

fn ceiling_in_range(ceiling: f64) -> bool {
    (constants::MIN_PRICE_CEILING..=constants::MAX_PRICE_CEILING).contains(&ceiling)
}

fn ceiling_warning(field: &str, value: f64, default: f64) -> String {
    range_warning(
        &format!("estimation.{field}"),
        value,
        &format!(
            "{}-{}",
            constants::MIN_PRICE_CEILING,
            constants::MAX_PRICE_CEILING,
        ),
        default,
    )
}

/// Warning text for a rejected value, naming the default that replaces it.
fn range_warning(
    field: &str,
    value: impl std::fmt::Display,
    expected: &str,
    default: impl std::fmt::Display,
) -> String {
    let err = ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    };
    format!("{err}. Using default ({default}).")
}
