// PropVal - core/clean.rs
//
// Deduplication and outlier rejection, applied in that order to the
// comparable set before scoring and statistics.

use crate::core::model::{Comparable, EstimationConfig};
use crate::util::constants::{PRICE_PER_AREA_MAX, PRICE_PER_AREA_MIN};
use std::collections::HashSet;

/// Collapse exact duplicates, keeping the first occurrence.
///
/// Two comparables are duplicates when raw date, address, rounded price and
/// rounded living area are all equal. Unknown numbers count as 0 in the key.
pub fn dedup(comparables: Vec<Comparable<'_>>) -> Vec<Comparable<'_>> {
    let mut seen: HashSet<(&str, &str, i64, i64)> = HashSet::with_capacity(comparables.len());
    let before = comparables.len();

    let kept: Vec<Comparable<'_>> = comparables
        .into_iter()
        .filter(|c| {
            let r = c.record;
            seen.insert((
                r.raw_date.as_str(),
                r.address.as_str(),
                r.price.unwrap_or(0.0).round() as i64,
                r.living_area.unwrap_or(0.0).round() as i64,
            ))
        })
        .collect();

    if kept.len() < before {
        tracing::debug!(removed = before - kept.len(), "Duplicate comparables removed");
    }
    kept
}

/// Reject implausible transactions.
///
/// Drops comparables with unknown price or area, a price above the ceiling
/// for `subject_type`, or a price per m² outside the fixed plausibility band.
pub fn clean<'a>(
    comparables: Vec<Comparable<'a>>,
    subject_type: &str,
    config: &EstimationConfig,
) -> Vec<Comparable<'a>> {
    let ceiling = config.price_ceiling(subject_type);
    let before = comparables.len();

    let kept: Vec<Comparable<'a>> = comparables
        .into_iter()
        .filter(|c| is_plausible(c, ceiling))
        .collect();

    tracing::debug!(
        before,
        after = kept.len(),
        ceiling,
        "Outlier comparables rejected"
    );
    kept
}

fn is_plausible(comparable: &Comparable<'_>, ceiling: f64) -> bool {
    let record = comparable.record;
    let Some(price) = record.price else {
        return false;
    };
    if price > ceiling {
        return false;
    }
    match record.price_per_area() {
        Some(ppa) => (PRICE_PER_AREA_MIN..=PRICE_PER_AREA_MAX).contains(&ppa),
        None => false,
    }
}
