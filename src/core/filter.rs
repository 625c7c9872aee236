// PropVal - core/filter.rs
//
// Comparable selection. All predicates are AND-combined; the cheap
// attribute checks run before the distance computation.
// Core layer: pure logic, no I/O.

use crate::core::geo::haversine_km;
use crate::core::model::{Comparable, EstimationConfig, SubjectProperty, TransactionRecord};
use rayon::prelude::*;

/// Select the records comparable to `subject`, in dataset order.
///
/// Each returned comparable carries its distance to the subject. The base
/// dataset is only borrowed; nothing is copied or mutated.
pub fn select_comparables<'a>(
    records: &'a [TransactionRecord],
    subject: &SubjectProperty,
    config: &EstimationConfig,
) -> Vec<Comparable<'a>> {
    let criteria = Criteria::new(subject, config);

    let selected: Vec<Comparable<'a>> = records
        .par_iter()
        .filter_map(|record| criteria.matches(record).map(|d| Comparable::new(record, d)))
        .collect();

    tracing::debug!(
        scanned = records.len(),
        matched = selected.len(),
        property_type = %subject.property_type,
        radius_km = subject.radius_km,
        "Comparable filter applied"
    );

    selected
}

/// Bands and switches derived once per request from the subject and config.
struct Criteria<'s> {
    subject: &'s SubjectProperty,
    config: &'s EstimationConfig,
    commercial: bool,
    surface_band: (f64, f64),
    land_band: Option<(f64, f64)>,
    filter_rooms: bool,
}

impl<'s> Criteria<'s> {
    fn new(subject: &'s SubjectProperty, config: &'s EstimationConfig) -> Self {
        let band = |value: f64, tolerance: f64| (value * (1.0 - tolerance), value * (1.0 + tolerance));
        let land_band = if config.land_filter_active(subject) {
            subject.land_area.map(|a| band(a, config.land_tolerance))
        } else {
            None
        };
        Self {
            subject,
            config,
            commercial: config.is_commercial(&subject.property_type),
            surface_band: band(subject.living_area, config.surface_tolerance),
            land_band,
            filter_rooms: config.room_filter_active(subject),
        }
    }

    /// Distance to the subject if `record` passes every predicate.
    fn matches(&self, record: &TransactionRecord) -> Option<f64> {
        if !self.type_matches(&record.property_type) {
            return None;
        }

        // Unknown price, area or coordinates: unusable.
        record.price?;
        let area = record.living_area?;
        let location = record.location()?;

        // Undated records fail every recency bound.
        if record.date? < self.config.min_date {
            return None;
        }

        if !within(area, self.surface_band) {
            return None;
        }

        if let Some(land_band) = self.land_band {
            if !within(record.land_area?, land_band) {
                return None;
            }
        }

        if self.filter_rooms && !self.subject.rooms.matches(record.room_count?) {
            return None;
        }

        let distance = haversine_km(self.subject.location, location);
        (distance <= self.subject.radius_km).then_some(distance)
    }

    fn type_matches(&self, record_type: &str) -> bool {
        if self.commercial {
            self.config.is_commercial(record_type)
        } else {
            record_type == self.subject.property_type
        }
    }
}

fn within(value: f64, (lo, hi): (f64, f64)) -> bool {
    value >= lo && value <= hi
}
