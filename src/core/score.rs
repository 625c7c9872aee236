// PropVal - core/score.rs
//
// Similarity scoring for display ordering. Statistics never depend on the
// order produced here.

use crate::core::model::{Comparable, EstimationConfig, SubjectProperty};
use crate::util::constants;

/// Similarity of one comparable to the subject; lower is closer.
///
/// `|area - subject area| / subject area + room penalty + distance penalty`.
pub fn similarity(comparable: &Comparable<'_>, subject: &SubjectProperty, config: &EstimationConfig) -> f64 {
    let record = comparable.record;
    let surface_diff = record
        .living_area
        .map(|a| (a - subject.living_area).abs() / subject.living_area)
        .unwrap_or(0.0);

    let room_penalty = match record.room_count {
        Some(rooms) if config.room_filter_active(subject) => {
            if subject.rooms.wants_or_more() && rooms >= constants::ROOMS_OR_MORE {
                0.0
            } else {
                let min_diff = subject
                    .rooms
                    .iter()
                    .map(|wanted| (f64::from(rooms) - f64::from(wanted)).abs())
                    .fold(f64::INFINITY, f64::min);
                constants::ROOM_PENALTY_PER_ROOM * min_diff.min(constants::ROOM_PENALTY_MAX_DIFF)
            }
        }
        _ => 0.0,
    };

    let distance_penalty = (comparable.distance_km
        / subject.radius_km.max(constants::MIN_SCORING_RADIUS_KM))
    .min(1.0)
        * constants::DISTANCE_PENALTY_WEIGHT;

    surface_diff + room_penalty + distance_penalty
}

/// Score every comparable and sort best-first.
///
/// Ties on score are broken by ascending distance.
pub fn rank(comparables: &mut [Comparable<'_>], subject: &SubjectProperty, config: &EstimationConfig) {
    for c in comparables.iter_mut() {
        c.score = similarity(c, subject, config);
    }
    comparables.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.distance_km.total_cmp(&b.distance_km))
    });
}
