// PropVal - core/estimate.rs
//
// The valuation pipeline: filter -> dedup -> clean -> rank -> statistics.
// Synchronous and allocation-light; borrows the dataset for the duration
// of one request.

use crate::core::model::{Comparable, EstimateResult, EstimationConfig, SubjectProperty, TransactionRecord};
use crate::core::{clean, filter, score, stats};
use serde::Serialize;

/// Number of comparables left after each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineCounts {
    pub matched: usize,
    pub after_dedup: usize,
    pub after_clean: usize,
}

/// A successful valuation.
#[derive(Debug, Clone)]
pub struct Valuation<'a> {
    pub result: EstimateResult,

    /// Every cleaned comparable, ranked best-first.
    pub comparables: Vec<Comparable<'a>>,

    /// Length of the display slice (`top_n` capped at the comparable count).
    pub top_n: usize,

    pub counts: PipelineCounts,
}

impl<'a> Valuation<'a> {
    /// The best-ranked comparables, for tables and maps.
    pub fn top(&self) -> &[Comparable<'a>] {
        &self.comparables[..self.top_n]
    }
}

/// Outcome of one estimation. An empty comparable set is an expected
/// answer, not an error.
#[derive(Debug, Clone)]
pub enum EstimateOutcome<'a> {
    Found(Valuation<'a>),
    NoComparables { counts: PipelineCounts },
}

impl<'a> EstimateOutcome<'a> {
    pub fn valuation(&self) -> Option<&Valuation<'a>> {
        match self {
            EstimateOutcome::Found(v) => Some(v),
            EstimateOutcome::NoComparables { .. } => None,
        }
    }

    pub fn counts(&self) -> PipelineCounts {
        match self {
            EstimateOutcome::Found(v) => v.counts,
            EstimateOutcome::NoComparables { counts } => *counts,
        }
    }
}

/// Value `subject` against `records`.
pub fn run<'a>(
    records: &'a [TransactionRecord],
    subject: &SubjectProperty,
    config: &EstimationConfig,
) -> EstimateOutcome<'a> {
    let matched = filter::select_comparables(records, subject, config);
    let mut counts = PipelineCounts {
        matched: matched.len(),
        ..Default::default()
    };

    let unique = clean::dedup(matched);
    counts.after_dedup = unique.len();

    let mut cleaned = clean::clean(unique, &subject.property_type, config);
    counts.after_clean = cleaned.len();

    // Statistics run over the full cleaned set; ranking only reorders it.
    let Some(result) = stats::estimate(&cleaned, subject.living_area) else {
        tracing::info!(
            matched = counts.matched,
            after_dedup = counts.after_dedup,
            "No comparable sales found"
        );
        return EstimateOutcome::NoComparables { counts };
    };

    score::rank(&mut cleaned, subject, config);
    let top_n = config.top_n.min(cleaned.len());

    tracing::info!(
        comparables = result.count,
        median_per_m2 = result.median_price_per_area.round(),
        low = result.estimates.low.round(),
        high = result.estimates.high.round(),
        "Estimate computed"
    );

    EstimateOutcome::Found(Valuation {
        result,
        comparables: cleaned,
        top_n,
        counts,
    })
}
