// PropVal - app/report.rs
//
// Plain-text rendering of an estimation: criteria line, KPI block, the four
// estimates and the top-N comparable table. Amounts use French grouping
// (narrow no-break space between thousands).

use crate::core::estimate::{EstimateOutcome, Valuation};
use crate::core::model::{Comparable, EstimationConfig, SubjectProperty};
use std::fmt;

/// Thousands separator used by French locale formatting (U+202F).
const GROUP_SEPARATOR: char = '\u{202F}';

/// Placeholder for unknown values.
const UNKNOWN: &str = "-";

/// Round and group a number: 1234567.4 -> "1 234 567". Non-finite -> "-".
pub fn format_int(value: f64) -> String {
    if !value.is_finite() {
        return UNKNOWN.to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(ch);
    }
    out
}

pub fn format_opt_int(value: Option<f64>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), format_int)
}

pub fn format_euro(value: f64) -> String {
    format!("{} €", format_int(value))
}

pub fn format_m2(value: f64) -> String {
    format!("{} €/m²", format_int(value))
}

/// One-line summary of the filter criteria in force.
pub fn criteria_line(subject: &SubjectProperty, config: &EstimationConfig) -> String {
    let area = subject.living_area;
    let tol = config.surface_tolerance;
    let rooms = if config.room_filter_active(subject) {
        subject.rooms.label()
    } else {
        "any".to_string()
    };

    let mut line = format!(
        "{} • radius {} km • surface {}–{} m² • rooms {}",
        subject.property_type,
        subject.radius_km,
        format_int(area * (1.0 - tol)),
        format_int(area * (1.0 + tol)),
        rooms,
    );
    if config.land_filter_active(subject) {
        if let Some(land) = subject.land_area {
            let ltol = config.land_tolerance;
            line.push_str(&format!(
                " • land {}–{} m²",
                format_int(land * (1.0 - ltol)),
                format_int(land * (1.0 + ltol)),
            ));
        }
    }
    line.push_str(&format!(" • since {}", config.min_date.format("%d/%m/%Y")));
    line
}

/// Full text report for one estimation outcome.
pub struct Report<'r, 'a> {
    pub subject: &'r SubjectProperty,
    pub config: &'r EstimationConfig,
    pub outcome: &'r EstimateOutcome<'a>,
}

impl fmt::Display for Report<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", criteria_line(self.subject, self.config))?;
        writeln!(f)?;
        match self.outcome {
            EstimateOutcome::Found(valuation) => self.write_valuation(f, valuation),
            EstimateOutcome::NoComparables { counts } => writeln!(
                f,
                "No comparable sales found (matched {}, after dedup {}, after cleaning {}). \
                 Try a wider radius or fewer constraints.",
                counts.matched, counts.after_dedup, counts.after_clean
            ),
        }
    }
}

impl Report<'_, '_> {
    fn write_valuation(&self, f: &mut fmt::Formatter<'_>, valuation: &Valuation<'_>) -> fmt::Result {
        let r = &valuation.result;
        writeln!(f, "Comparable sales     {}", format_int(r.count as f64))?;
        writeln!(f, "Mean price / m²      {}", format_m2(r.mean_price_per_area))?;
        writeln!(f, "Median price / m²    {}", format_m2(r.median_price_per_area))?;
        writeln!(
            f,
            "Market band (10→90%) {} → {}",
            format_m2(r.p10_price_per_area),
            format_m2(r.p90_price_per_area)
        )?;
        writeln!(f)?;

        let e = &r.estimates;
        writeln!(f, "Low estimate         {}", format_euro(e.low))?;
        writeln!(f, "Mean estimate        {}", format_euro(e.mean))?;
        writeln!(f, "Median estimate      {}", format_euro(e.median))?;
        writeln!(f, "High estimate        {}", format_euro(e.high))?;
        writeln!(f)?;

        let show_land = self.config.land_filter_active(self.subject);
        let top = valuation.top();
        writeln!(f, "Top {} of {} comparables", top.len(), valuation.comparables.len())?;
        write!(f, "{:<12} {:<48} {:>8}", "Date", "Address", "Surface")?;
        if show_land {
            write!(f, " {:>8}", "Land")?;
        }
        writeln!(f, " {:>5} {:>12} {:>12} {:>9}", "Rooms", "Price", "€/m²", "Distance")?;
        for c in top {
            write_row(f, c, show_land)?;
        }
        Ok(())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, c: &Comparable<'_>, show_land: bool) -> fmt::Result {
    let r = c.record;
    let date = if r.raw_date.is_empty() {
        UNKNOWN
    } else {
        r.raw_date.as_str()
    };
    write!(
        f,
        "{:<12} {:<48} {:>8}",
        date,
        r.address,
        format_opt_int(r.living_area)
    )?;
    if show_land {
        write!(f, " {:>8}", format_opt_int(r.land_area))?;
    }
    writeln!(
        f,
        " {:>5} {:>12} {:>12} {:>7} m",
        r.room_count.map_or_else(|| UNKNOWN.to_string(), |n| n.to_string()),
        format_opt_int(r.price),
        format_opt_int(r.price_per_area()),
        format_int(c.distance_km * 1000.0),
    )
}
