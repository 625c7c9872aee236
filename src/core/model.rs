// PropVal - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies. These types are the shared vocabulary across
// all layers.
//
// Unknown numeric fields are `None`, never NaN: every consumer must check
// that a field is known before comparing it.

use crate::util::constants;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

// =============================================================================
// Transaction record (normalised output of parsing)
// =============================================================================

/// One historical sale, as read from the dataset.
///
/// Records are immutable once parsed. A record whose price, area or
/// coordinates are unknown stays in the dataset; it simply never passes
/// the comparable filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// Sale price in euros.
    pub price: Option<f64>,

    /// Property type label as written in the dataset (e.g. "Maison").
    pub property_type: String,

    /// Living area in m².
    pub living_area: Option<f64>,

    /// Main room count, rounded to the nearest integer.
    pub room_count: Option<u32>,

    /// Land area in m².
    pub land_area: Option<f64>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Synthesised display address (street, postal code, city).
    pub address: String,

    /// Date cell exactly as read (trimmed).
    pub raw_date: String,

    /// Parsed sale date. `None` if the cell was empty or unparseable.
    pub date: Option<NaiveDate>,
}

impl TransactionRecord {
    /// Record coordinates, if both are known.
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Price divided by living area, if both are known and the ratio is finite.
    pub fn price_per_area(&self) -> Option<f64> {
        let ratio = self.price? / self.living_area?;
        ratio.is_finite().then_some(ratio)
    }
}

// =============================================================================
// Geography
// =============================================================================

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

// =============================================================================
// Room selection
// =============================================================================

/// Set of requested room counts. Empty means "any".
///
/// The value [`constants::ROOMS_OR_MORE`] stands for "that many or more".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSelection(BTreeSet<u32>);

impl RoomSelection {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if the "N or more" sentinel is part of the selection.
    pub fn wants_or_more(&self) -> bool {
        self.0.contains(&constants::ROOMS_OR_MORE)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// Membership test for a known room count.
    pub fn matches(&self, rooms: u32) -> bool {
        self.0.contains(&rooms) || (self.wants_or_more() && rooms >= constants::ROOMS_OR_MORE)
    }

    /// Human-readable form: "2, 3, 6+" or "any".
    pub fn label(&self) -> String {
        if self.is_empty() {
            return "any".to_string();
        }
        self.0
            .iter()
            .map(|&r| {
                if r == constants::ROOMS_OR_MORE {
                    format!("{r}+")
                } else {
                    r.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<u32> for RoomSelection {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Subject property
// =============================================================================

/// The property being valued. One per estimation request.
#[derive(Debug, Clone)]
pub struct SubjectProperty {
    pub property_type: String,

    /// Living area in m². Always finite and positive once validated.
    pub living_area: f64,

    pub rooms: RoomSelection,

    /// Land area in m². Only used for house-like subjects when positive.
    pub land_area: Option<f64>,

    pub radius_km: f64,

    /// Coordinates resolved by the geocoder.
    pub location: GeoPoint,
}

// =============================================================================
// Estimation configuration
// =============================================================================

/// Tunables injected into the filter, clean and scoring stages.
///
/// The price-per-area plausibility band is not configurable: it is a
/// fixed constant (see [`constants::PRICE_PER_AREA_MIN`]).
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationConfig {
    /// Fractional living-area band either side of the subject.
    pub surface_tolerance: f64,

    /// Fractional land-area band for house-like subjects.
    pub land_tolerance: f64,

    /// Transactions dated before this are ignored.
    pub min_date: NaiveDate,

    pub apartment_price_ceiling: f64,
    pub house_price_ceiling: f64,

    /// Number of ranked comparables surfaced for display.
    pub top_n: usize,

    pub house_type: String,
    pub apartment_type: String,

    /// A subject type starting with this prefix matches every record type
    /// with the same prefix, and ignores the room filter.
    pub commercial_prefix: String,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            surface_tolerance: constants::DEFAULT_SURFACE_TOLERANCE,
            land_tolerance: constants::DEFAULT_LAND_TOLERANCE,
            min_date: default_min_date(),
            apartment_price_ceiling: constants::DEFAULT_APARTMENT_PRICE_CEILING,
            house_price_ceiling: constants::DEFAULT_HOUSE_PRICE_CEILING,
            top_n: constants::DEFAULT_TOP_N,
            house_type: constants::DEFAULT_HOUSE_TYPE.to_string(),
            apartment_type: constants::DEFAULT_APARTMENT_TYPE.to_string(),
            commercial_prefix: constants::DEFAULT_COMMERCIAL_PREFIX.to_string(),
        }
    }
}

impl EstimationConfig {
    pub fn is_house(&self, property_type: &str) -> bool {
        property_type.eq_ignore_ascii_case(&self.house_type)
    }

    pub fn is_apartment(&self, property_type: &str) -> bool {
        property_type.eq_ignore_ascii_case(&self.apartment_type)
    }

    pub fn is_commercial(&self, property_type: &str) -> bool {
        !self.commercial_prefix.is_empty()
            && property_type
                .to_lowercase()
                .starts_with(&self.commercial_prefix.to_lowercase())
    }

    /// Price ceiling applied by the cleaning stage for the subject's type.
    pub fn price_ceiling(&self, property_type: &str) -> f64 {
        if self.is_apartment(property_type) {
            self.apartment_price_ceiling
        } else {
            self.house_price_ceiling
        }
    }

    /// The room filter applies only to non-commercial subjects with a selection.
    pub fn room_filter_active(&self, subject: &SubjectProperty) -> bool {
        !subject.rooms.is_empty() && !self.is_commercial(&subject.property_type)
    }

    /// The land filter applies to house-like subjects with a positive land area.
    pub fn land_filter_active(&self, subject: &SubjectProperty) -> bool {
        self.is_house(&subject.property_type)
            && subject.land_area.is_some_and(|a| a.is_finite() && a > 0.0)
    }
}

/// 2023-01-01, the default recency cutoff.
pub fn default_min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

// =============================================================================
// Comparables
// =============================================================================

/// A record that passed the comparable filter, with its request-specific
/// distance and similarity score. Borrowed from the dataset, never copied.
#[derive(Debug, Clone, Serialize)]
pub struct Comparable<'a> {
    #[serde(flatten)]
    pub record: &'a TransactionRecord,

    /// Great-circle distance to the subject.
    pub distance_km: f64,

    /// Similarity to the subject; lower is closer. Zero until scored.
    pub score: f64,
}

impl<'a> Comparable<'a> {
    pub fn new(record: &'a TransactionRecord, distance_km: f64) -> Self {
        Self {
            record,
            distance_km,
            score: 0.0,
        }
    }
}

// =============================================================================
// Estimate result
// =============================================================================

/// Descriptive statistics over the cleaned comparable set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimateResult {
    /// Comparables that contributed a price per area.
    pub count: usize,

    pub mean_price_per_area: f64,
    pub median_price_per_area: f64,
    pub p10_price_per_area: f64,
    pub p90_price_per_area: f64,

    pub estimates: EstimateBands,
}

/// Price-per-area statistics multiplied by the subject living area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EstimateBands {
    pub low: f64,
    pub mean: f64,
    pub median: f64,
    pub high: f64,
}

// =============================================================================
// Dataset
// =============================================================================

/// Encoding detected for the dataset bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    /// UTF-8, with or without byte-order mark.
    Utf8 { bom: bool },
    /// Western single-byte (Windows-1252 superset of Latin-1).
    Windows1252,
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextEncoding::Utf8 { bom: true } => f.write_str("UTF-8 (BOM)"),
            TextEncoding::Utf8 { bom: false } => f.write_str("UTF-8"),
            TextEncoding::Windows1252 => f.write_str("Windows-1252"),
        }
    }
}

/// The parsed transaction dataset plus load metadata.
///
/// Built once at startup and shared read-only (behind an `Arc`) by every
/// estimation request.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<TransactionRecord>,
    pub delimiter: u8,
    pub encoding: TextEncoding,
    /// File the dataset came from, if any.
    pub source: Option<PathBuf>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
