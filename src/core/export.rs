// PropVal - core/export.rs
//
// CSV and JSON export of ranked comparables.
// Core layer: writes to any Write trait object.

use crate::core::model::Comparable;
use crate::util::error::ExportError;
use std::io::Write;
use std::path::Path;

/// Export format, chosen from the target file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// `.json` selects JSON; anything else is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

/// Export comparables to CSV (semicolon-delimited, French spreadsheet friendly).
///
/// Writes: date, address, type, surface, land, rooms, price, price_per_m2,
/// distance_m, score. Unknown values are written as empty cells.
pub fn export_csv<W: Write>(
    comparables: &[Comparable<'_>],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |e| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };
    let mut csv_writer = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

    csv_writer
        .write_record([
            "date",
            "address",
            "type",
            "surface",
            "land",
            "rooms",
            "price",
            "price_per_m2",
            "distance_m",
            "score",
        ])
        .map_err(csv_err)?;

    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();

    let mut count = 0;
    for c in comparables {
        let r = c.record;
        csv_writer
            .write_record([
                r.raw_date.clone(),
                r.address.clone(),
                r.property_type.clone(),
                opt(r.living_area),
                opt(r.land_area),
                r.room_count.map(|n| n.to_string()).unwrap_or_default(),
                opt(r.price),
                opt(r.price_per_area().map(f64::round)),
                format!("{:.0}", c.distance_km * 1000.0),
                format!("{:.4}", c.score),
            ])
            .map_err(csv_err)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

/// Export comparables to JSON (array of objects).
pub fn export_json<W: Write>(
    comparables: &[Comparable<'_>],
    mut writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    serde_json::to_writer_pretty(&mut writer, comparables).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(comparables.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::TransactionRecord;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn make_record(address: &str) -> TransactionRecord {
        TransactionRecord {
            price: Some(250_000.0),
            property_type: "Appartement".to_string(),
            living_area: Some(62.5),
            room_count: Some(3),
            land_area: None,
            latitude: Some(45.76),
            longitude: Some(4.85),
            address: address.to_string(),
            raw_date: "2024-01-15".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15),
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Csv);
    }

    #[test]
    fn test_csv_export() {
        let records = vec![make_record("1 RUE A, 69003 Lyon"), make_record("2 RUE B, 69003 Lyon")];
        let comps: Vec<_> = records.iter().map(|r| Comparable::new(r, 0.4321)).collect();
        let mut buf = Vec::new();
        let count = export_csv(&comps, &mut buf, &PathBuf::from("out.csv")).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        assert!(output.starts_with("date;address;type;surface"));
        assert!(output.contains("2024-01-15;1 RUE A, 69003 Lyon;Appartement;62.5;;3;250000;4000;432;"));
        assert!(output.contains("2 RUE B"));
    }

    #[test]
    fn test_json_export() {
        let records = vec![make_record("1 RUE A")];
        let comps = vec![Comparable::new(&records[0], 1.5)];
        let mut buf = Vec::new();
        let count = export_json(&comps, &mut buf, &PathBuf::from("out.json")).unwrap();
        assert_eq!(count, 1);

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["address"], "1 RUE A");
        assert_eq!(value[0]["distance_km"], 1.5);
        assert_eq!(value[0]["date"], "2024-01-15");
    }
}
