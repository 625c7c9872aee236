// PropVal - core/stats.rs
//
// Descriptive statistics over the cleaned comparable set.

use crate::core::model::{Comparable, EstimateBands, EstimateResult};
use crate::util::constants::{HIGH_PERCENTILE, LOW_PERCENTILE};

/// Compute the estimate for a subject of `subject_area` m².
///
/// Runs over every comparable given (not a display subset). Returns `None`
/// when no comparable has a finite price per area.
pub fn estimate(comparables: &[Comparable<'_>], subject_area: f64) -> Option<EstimateResult> {
    let mut values: Vec<f64> = comparables
        .iter()
        .filter_map(|c| c.record.price_per_area())
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let mean = mean(&values)?;
    let median = median_sorted(&values)?;
    let p10 = percentile_sorted(&values, LOW_PERCENTILE)?;
    let p90 = percentile_sorted(&values, HIGH_PERCENTILE)?;

    Some(EstimateResult {
        count: values.len(),
        mean_price_per_area: mean,
        median_price_per_area: median,
        p10_price_per_area: p10,
        p90_price_per_area: p90,
        estimates: EstimateBands {
            low: p10 * subject_area,
            mean: mean * subject_area,
            median: median * subject_area,
            high: p90 * subject_area,
        },
    })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of an ascending slice; the two central values are averaged when
/// the length is even.
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Linear-interpolation percentile of an ascending slice at fractional rank
/// `(n - 1) * p`, with `p` in `[0, 1]`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::TransactionRecord;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_median() {
        assert_eq!(median_sorted(&[10.0, 20.0, 30.0]), Some(20.0));
        assert_eq!(median_sorted(&[10.0, 20.0, 30.0, 40.0]), Some(25.0));
        assert_eq!(median_sorted(&[7.0]), Some(7.0));
        assert_eq!(median_sorted(&[]), None);
    }

    #[test]
    fn test_percentile_interpolation() {
        let values: Vec<f64> = (1..=10).map(|i| f64::from(i) * 10.0).collect();
        // rank = 9 * 0.9 = 8.1 -> 90 + 0.1 * (100 - 90)
        assert!(approx(percentile_sorted(&values, 0.9).unwrap(), 91.0));
        // rank = 0.9 -> 10 + 0.9 * 10
        assert!(approx(percentile_sorted(&values, 0.1).unwrap(), 19.0));
        assert_eq!(percentile_sorted(&values, 0.0), Some(10.0));
        assert_eq!(percentile_sorted(&values, 1.0), Some(100.0));
        assert_eq!(percentile_sorted(&[42.0], 0.9), Some(42.0));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    fn make_record(price: f64, area: f64) -> TransactionRecord {
        TransactionRecord {
            price: Some(price),
            property_type: "Maison".to_string(),
            living_area: Some(area),
            room_count: None,
            land_area: None,
            latitude: None,
            longitude: None,
            address: "-".to_string(),
            raw_date: String::new(),
            date: None,
        }
    }

    #[test]
    fn test_estimate_bands() {
        let records = vec![
            make_record(400_000.0, 100.0),
            make_record(200_000.0, 100.0),
            make_record(300_000.0, 100.0),
        ];
        let comps: Vec<_> = records.iter().map(|r| Comparable::new(r, 0.0)).collect();
        let result = estimate(&comps, 80.0).unwrap();
        assert_eq!(result.count, 3);
        assert!(approx(result.mean_price_per_area, 3000.0));
        assert!(approx(result.median_price_per_area, 3000.0));
        assert!(approx(result.p10_price_per_area, 2200.0));
        assert!(approx(result.p90_price_per_area, 3800.0));
        assert!(approx(result.estimates.low, 176_000.0));
        assert!(approx(result.estimates.median, 240_000.0));
        assert!(approx(result.estimates.high, 304_000.0));
    }

    #[test]
    fn test_estimate_empty_is_none() {
        assert!(estimate(&[], 100.0).is_none());
        let unknown = TransactionRecord {
            price: None,
            ..make_record(0.0, 100.0)
        };
        assert!(estimate(&[Comparable::new(&unknown, 0.0)], 100.0).is_none());
    }
}
