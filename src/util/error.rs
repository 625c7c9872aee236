// PropVal - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Each subsystem owns one enum; `PropValError` wraps them for callers that
// cross subsystem boundaries. "No comparables" is an outcome, not an error.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all PropVal operations.
#[derive(Debug)]
pub enum PropValError {
    /// Dataset could not be loaded. Fatal for the session.
    DataFormat(DataFormatError),

    /// A single estimation request failed. The session stays usable.
    Request(RequestError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Export operation failed.
    Export(ExportError),
}

impl fmt::Display for PropValError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataFormat(e) => write!(f, "Dataset error: {e}"),
            Self::Request(e) => write!(f, "Request error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
        }
    }
}

impl std::error::Error for PropValError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DataFormat(e) => Some(e),
            Self::Request(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Export(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset errors
// ---------------------------------------------------------------------------

/// Errors raised while reading or parsing the transaction dataset.
#[derive(Debug)]
pub enum DataFormatError {
    /// Fewer than a header line plus one data line.
    TooFewLines { lines: usize, min: usize },

    /// One or more required columns could not be resolved from the header.
    MissingColumns { missing: Vec<&'static str> },

    /// The delimited reader rejected a row.
    Csv { line: u64, source: csv::Error },

    /// I/O error reading the dataset file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for DataFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewLines { lines, min } => write!(
                f,
                "dataset is empty or malformed: {lines} non-blank line(s), need at least {min}"
            ),
            Self::MissingColumns { missing } => write!(
                f,
                "required column(s) not found in header: {}",
                missing.join(", ")
            ),
            Self::Csv { line, source } => write!(f, "line {line}: {source}"),
            Self::Io { path, source } => {
                write!(f, "cannot read dataset '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DataFormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DataFormatError> for PropValError {
    fn from(e: DataFormatError) -> Self {
        Self::DataFormat(e)
    }
}

// ---------------------------------------------------------------------------
// Request errors
// ---------------------------------------------------------------------------

/// Recoverable, per-request failures. The user fixes the input and resubmits.
#[derive(Debug)]
pub enum RequestError {
    /// The dataset has not finished loading (or failed to load).
    NotReady,

    /// A required form input is missing or invalid.
    Validation { field: &'static str, reason: String },

    /// The geocoder returned no match for the address.
    AddressNotFound { query: String },

    /// The geocoder could not be reached or answered garbage.
    Geocoding(GeocodeError),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(
                f,
                "transaction data is still loading; retry in a few seconds"
            ),
            Self::Validation { field, reason } => write!(f, "invalid '{field}': {reason}"),
            Self::AddressNotFound { query } => write!(
                f,
                "address not found: '{query}'. Check the street, postal code and city"
            ),
            Self::Geocoding(e) => write!(f, "geocoding failed: {e}"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Geocoding(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RequestError> for PropValError {
    fn from(e: RequestError) -> Self {
        Self::Request(e)
    }
}

impl From<GeocodeError> for RequestError {
    fn from(e: GeocodeError) -> Self {
        Self::Geocoding(e)
    }
}

// ---------------------------------------------------------------------------
// Geocoding errors
// ---------------------------------------------------------------------------

/// Transport-level geocoder failures. An empty answer is not an error.
#[derive(Debug)]
pub enum GeocodeError {
    /// Request could not be sent or the connection failed.
    Network { source: reqwest::Error },

    /// Service answered with a non-success status.
    Http { status: u16 },

    /// Response body was not the expected JSON shape.
    Parse { source: serde_json::Error },
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { source } => write!(f, "network error: {source}"),
            Self::Http { status } => write!(f, "geocoder answered HTTP {status}"),
            Self::Parse { source } => write!(f, "unexpected geocoder response: {source}"),
        }
    }
}

impl std::error::Error for GeocodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Network { source } => Some(source),
            Self::Parse { source } => Some(source),
            Self::Http { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to comparable export.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for PropValError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for PropValError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for PropVal results.
pub type Result<T> = std::result::Result<T, PropValError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_missing_columns_lists_every_column() {
        let err = DataFormatError::MissingColumns {
            missing: vec!["price", "latitude"],
        };
        assert_eq!(
            err.to_string(),
            "required column(s) not found in header: price, latitude"
        );
    }

    #[test]
    fn test_top_level_error_keeps_source_chain() {
        let err: PropValError = DataFormatError::Io {
            path: PathBuf::from("missing.csv"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        }
        .into();
        let inner = err.source().expect("dataset error should be the source");
        assert!(inner.to_string().contains("missing.csv"));
        assert!(inner.source().is_some(), "io::Error should be chained");
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = RequestError::Validation {
            field: "living_area",
            reason: "must be greater than zero".to_string(),
        };
        assert!(err.to_string().contains("living_area"));
    }
}
