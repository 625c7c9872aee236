// PropVal - core/parser.rs
//
// Dataset parsing and normalisation.
// Core layer: accepts raw bytes, never touches the filesystem directly.
//
// Pipeline: decode bytes -> sniff delimiter on the header line -> resolve
// header aliases into column indices -> read rows with the csv crate ->
// normalise every cell into a `TransactionRecord`. Bad cells become unknown
// fields; only a malformed file or missing required columns is fatal.

use crate::core::model::{Dataset, TextEncoding, TransactionRecord};
use crate::util::constants;
use crate::util::error::DataFormatError;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

// =============================================================================
// Columns and aliases
// =============================================================================

/// Logical dataset columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Price,
    PropertyType,
    LivingArea,
    RoomCount,
    LandArea,
    Latitude,
    Longitude,
    StreetNumber,
    StreetName,
    PostalCode,
    City,
    Date,
}

/// Number of logical columns.
pub const COLUMN_COUNT: usize = 12;

impl Column {
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Price,
        Column::PropertyType,
        Column::LivingArea,
        Column::RoomCount,
        Column::LandArea,
        Column::Latitude,
        Column::Longitude,
        Column::StreetNumber,
        Column::StreetName,
        Column::PostalCode,
        Column::City,
        Column::Date,
    ];

    /// Canonical name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Column::Price => "price",
            Column::PropertyType => "type",
            Column::LivingArea => "living area",
            Column::RoomCount => "room count",
            Column::LandArea => "land area",
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
            Column::StreetNumber => "street number",
            Column::StreetName => "street name",
            Column::PostalCode => "postal code",
            Column::City => "city",
            Column::Date => "date",
        }
    }

    /// Accepted header spellings, in priority order. Compared after
    /// [`normalize_header`] on both sides.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Price => &["valeur fonciere", "valeur_fonciere", "prix"],
            Column::PropertyType => &["type local", "type_local", "type"],
            Column::LivingArea => &[
                "surface reelle bati",
                "surface_reelle_bati",
                "surface habitable",
                "surface_habitable",
            ],
            Column::RoomCount => &[
                "nombre pieces principales",
                "nombre_pieces_principales",
                "pieces",
                "nb pieces principales",
            ],
            Column::LandArea => &["surface terrain", "surface_terrain"],
            Column::Latitude => &["latitude", "lat"],
            Column::Longitude => &["longitude", "lon", "lng"],
            Column::StreetNumber => &["adresse numero", "adresse_numero", "numero"],
            Column::StreetName => &["adresse nom de voie", "adresse_nom_de_voie", "voie"],
            Column::PostalCode => &["code postal", "code_postal", "cp"],
            Column::City => &["nom commune", "nom_commune", "commune", "ville"],
            Column::Date => &["date mutation", "date_mutation", "date"],
        }
    }

    pub fn is_required(self) -> bool {
        matches!(
            self,
            Column::Price
                | Column::PropertyType
                | Column::LivingArea
                | Column::Latitude
                | Column::Longitude
        )
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Header resolved into column indices, once per load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [Option<usize>; COLUMN_COUNT],
}

impl ColumnMap {
    /// Resolve raw header cells against the alias table.
    ///
    /// Fails with `MissingColumns` listing every unresolved required column.
    pub fn resolve<'h, I>(headers: I) -> Result<Self, DataFormatError>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let normalized: Vec<String> = headers.into_iter().map(normalize_header).collect();
        let mut map = ColumnMap::default();

        for column in Column::ALL {
            map.indices[column.slot()] = column.aliases().iter().find_map(|alias| {
                let alias = normalize_header(alias);
                normalized.iter().position(|h| *h == alias)
            });
        }

        let missing: Vec<&'static str> = Column::ALL
            .iter()
            .filter(|c| c.is_required() && map.get(**c).is_none())
            .map(|c| c.name())
            .collect();
        if !missing.is_empty() {
            return Err(DataFormatError::MissingColumns { missing });
        }

        Ok(map)
    }

    pub fn get(&self, column: Column) -> Option<usize> {
        self.indices[column.slot()]
    }
}

// =============================================================================
// Entry point
// =============================================================================

/// Parse the raw bytes of a delimited transaction file.
///
/// Every data row yields exactly one record, in file order; blank lines are
/// skipped. Quote characters are ordinary cell text, so a stray `"` never
/// joins lines. The returned dataset has no `source` path (the caller sets it).
pub fn parse_dataset(bytes: &[u8]) -> Result<Dataset, DataFormatError> {
    let (text, encoding) = decode(bytes);

    let non_blank: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if non_blank.len() < constants::MIN_DATASET_LINES {
        return Err(DataFormatError::TooFewLines {
            lines: non_blank.len(),
            min: constants::MIN_DATASET_LINES,
        });
    }
    let delimiter = detect_delimiter(non_blank[0]);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut columns: Option<ColumnMap> = None;
    let mut records = Vec::with_capacity(non_blank.len() - 1);
    let mut undated = 0usize;

    for result in reader.records() {
        let row = result.map_err(|e| DataFormatError::Csv {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            source: e,
        })?;
        if row.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        if let Some(map) = &columns {
            let record = build_record(&row, map);
            if record.date.is_none() {
                undated += 1;
            }
            records.push(record);
        } else {
            columns = Some(ColumnMap::resolve(row.iter())?);
        }
    }

    tracing::debug!(
        records = records.len(),
        undated,
        delimiter = %char::from(delimiter),
        encoding = %encoding,
        "Dataset parsed"
    );

    Ok(Dataset {
        records,
        delimiter,
        encoding,
        source: None,
    })
}

fn build_record(row: &csv::StringRecord, columns: &ColumnMap) -> TransactionRecord {
    let get = |column: Column| cell(row, columns, column);

    let raw_date = get(Column::Date).to_string();
    let date = parse_date(&raw_date);

    TransactionRecord {
        price: parse_number(get(Column::Price)),
        property_type: get(Column::PropertyType).to_string(),
        living_area: parse_number(get(Column::LivingArea)),
        room_count: parse_number(get(Column::RoomCount))
            .filter(|r| *r >= 0.0)
            .map(|r| r.round() as u32),
        land_area: parse_number(get(Column::LandArea)),
        latitude: parse_number(get(Column::Latitude)),
        longitude: parse_number(get(Column::Longitude)),
        address: synthesize_address(
            get(Column::StreetNumber),
            get(Column::StreetName),
            get(Column::PostalCode),
            get(Column::City),
        ),
        raw_date,
        date,
    }
}

/// Trimmed cell for `column`, or "" when the column or cell is absent.
fn cell<'r>(row: &'r csv::StringRecord, columns: &ColumnMap, column: Column) -> &'r str {
    columns
        .get(column)
        .and_then(|i| row.get(i))
        .map(str::trim)
        .unwrap_or("")
}

// =============================================================================
// Encoding and delimiter
// =============================================================================

/// Decode dataset bytes to text.
///
/// A UTF-8 byte-order mark selects UTF-8. Without one, bytes that are valid
/// UTF-8 are taken as such; anything else is decoded as Windows-1252.
pub fn decode(bytes: &[u8]) -> (String, TextEncoding) {
    if let Some(rest) = bytes.strip_prefix(constants::UTF8_BOM) {
        return (
            String::from_utf8_lossy(rest).into_owned(),
            TextEncoding::Utf8 { bom: true },
        );
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), TextEncoding::Utf8 { bom: false }),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            (decoded.into_owned(), TextEncoding::Windows1252)
        }
    }
}

/// Pick the delimiter occurring most often in the header line.
///
/// Candidates are checked in order `;` `,` `|`, so the earlier one wins a
/// tie. Falls back to `,` when none occurs.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let mut best = constants::FALLBACK_DELIMITER;
    let mut best_count = 0usize;
    for delim in constants::DELIMITER_CANDIDATES {
        let count = header_line.bytes().filter(|b| *b == delim).count();
        if count > best_count {
            best = delim;
            best_count = count;
        }
    }
    best
}

// =============================================================================
// Cell normalisation
// =============================================================================

/// Case-fold, strip diacritics and collapse whitespace.
///
/// `"  Valeur   Foncière "` becomes `"valeur fonciere"`.
pub fn normalize_header(raw: &str) -> String {
    let folded: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !is_combining_mark(*c))
        .map(strip_accent)
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

fn strip_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Parse a French-formatted number.
///
/// Whitespace (including non-breaking thousands separators) is removed and
/// the first decimal comma becomes a point. The whole cell must be a number:
/// trailing text such as a currency sign (`250000€`) makes it unknown rather
/// than reading the numeric prefix. Empty, unparseable or infinite input is
/// unknown.
pub fn parse_number(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    let value: f64 = compact.replacen(',', ".", 1).parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse a sale date.
///
/// `YYYY-MM-DD…` and `DD/MM/YYYY…` prefixes are tried first (trailing time
/// is ignored), then a handful of other common layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    static ISO: OnceLock<Regex> = OnceLock::new();
    static DMY: OnceLock<Regex> = OnceLock::new();

    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let iso = ISO.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})").expect("valid regex"));
    if let Some(caps) = iso.captures(s) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    let dmy = DMY.get_or_init(|| Regex::new(r"^(\d{2})/(\d{2})/(\d{4})").expect("valid regex"));
    if let Some(caps) = dmy.captures(s) {
        return ymd(&caps[3], &caps[2], &caps[1]);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    const FALLBACK_FORMATS: &[&str] = &["%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y", "%Y%m%d", "%d %b %Y", "%b %d %Y"];
    FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Build the display address: "<number> <street>, <postal code> <city>".
///
/// Without a street name the street part carries a partial-address marker.
/// A record with no address field at all shows "-".
pub fn synthesize_address(number: &str, street: &str, postal_code: &str, city: &str) -> String {
    if number.is_empty() && street.is_empty() && postal_code.is_empty() && city.is_empty() {
        return constants::UNKNOWN_ADDRESS.to_string();
    }

    let mut address = if street.is_empty() {
        format!("{number} {}", constants::PARTIAL_ADDRESS_MARKER)
            .trim()
            .to_string()
    } else {
        format!("{number} {street}").trim().to_string()
    };
    if !postal_code.is_empty() {
        address.push_str(", ");
        address.push_str(postal_code);
    }
    if !city.is_empty() {
        address.push(' ');
        address.push_str(city);
    }
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    const DVF_HEADER: &str = "date_mutation;valeur_fonciere;adresse_numero;adresse_nom_de_voie;code_postal;nom_commune;type_local;surface_reelle_bati;nombre_pieces_principales;surface_terrain;longitude;latitude";

    // =========================================================================
    // Numbers
    // =========================================================================

    #[test]
    fn test_parse_number_french_format() {
        assert_eq!(parse_number("1 234,5"), Some(1234.5));
        assert_eq!(parse_number("250000,00"), Some(250_000.0));
        assert_eq!(parse_number("1\u{a0}500\u{202f}000"), Some(1_500_000.0));
        assert_eq!(parse_number(" 42 "), Some(42.0));
        assert_eq!(parse_number("48.8566"), Some(48.8566));
        assert_eq!(parse_number("-1,5"), Some(-1.5));
    }

    #[test]
    fn test_parse_number_unknown_values() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("250000€"), None);
        assert_eq!(parse_number("100 m²"), None);
    }

    // =========================================================================
    // Headers
    // =========================================================================

    #[test]
    fn test_normalize_header_variants() {
        assert_eq!(normalize_header("  Valeur   Foncière "), "valeur fonciere");
        assert_eq!(normalize_header("NOMBRE PIÈCES PRINCIPALES"), "nombre pieces principales");
        // Decomposed form: 'e' followed by U+0300.
        assert_eq!(normalize_header("Fonci\u{0065}\u{0300}re"), "fonciere");
    }

    #[test]
    fn test_aliases_resolve_regardless_of_spelling() {
        let a = ColumnMap::resolve(["Valeur Foncière", "Type Local", "Surface Reelle Bati", "Lat", "LNG"]).unwrap();
        let b = ColumnMap::resolve(["valeur_fonciere", "type_local", "surface_reelle_bati", "latitude", "longitude"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get(Column::Price), Some(0));
        assert_eq!(a.get(Column::Longitude), Some(4));
        assert_eq!(a.get(Column::Date), None);
    }

    #[test]
    fn test_alias_priority_follows_list_order() {
        // "valeur fonciere" outranks "prix" even when it appears later.
        let map = ColumnMap::resolve(["prix", "valeur fonciere", "type", "surface habitable", "lat", "lon"]).unwrap();
        assert_eq!(map.get(Column::Price), Some(1));
    }

    #[test]
    fn test_missing_required_columns() {
        let err = ColumnMap::resolve(["prix", "type", "commune"]).unwrap_err();
        match err {
            DataFormatError::MissingColumns { missing } => {
                assert_eq!(missing, vec!["living area", "latitude", "longitude"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    // =========================================================================
    // Delimiter and encoding
    // =========================================================================

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c"), b';');
        assert_eq!(detect_delimiter("a,b,c"), b',');
        assert_eq!(detect_delimiter("a|b|c"), b'|');
        assert_eq!(detect_delimiter("single"), b',');
        // Tie: semicolon checked first.
        assert_eq!(detect_delimiter("a;b,c"), b';');
        assert_eq!(detect_delimiter("a,b,c;d"), b',');
    }

    #[test]
    fn test_decode_bom_and_windows_1252() {
        let (text, enc) = decode(b"\xEF\xBB\xBFprix;type");
        assert_eq!(text, "prix;type");
        assert_eq!(enc, TextEncoding::Utf8 { bom: true });

        let (text, enc) = decode(b"Valeur Fonci\xE8re");
        assert_eq!(text, "Valeur Foncière");
        assert_eq!(enc, TextEncoding::Windows1252);

        let (_, enc) = decode("Foncière".as_bytes());
        assert_eq!(enc, TextEncoding::Utf8 { bom: false });
    }

    // =========================================================================
    // Dates and addresses
    // =========================================================================

    #[test]
    fn test_parse_date_preferred_layouts() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024-03-15"), Some(d));
        assert_eq!(parse_date("2024-03-15T10:22:00"), Some(d));
        assert_eq!(parse_date("15/03/2024"), Some(d));
        assert_eq!(parse_date("15/03/2024 08:00"), Some(d));
    }

    #[test]
    fn test_parse_date_fallbacks_and_failures() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024/03/15"), Some(d));
        assert_eq!(parse_date("15.03.2024"), Some(d));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn test_synthesize_address() {
        assert_eq!(
            synthesize_address("12", "RUE DE LA PAIX", "75002", "Paris"),
            "12 RUE DE LA PAIX, 75002 Paris"
        );
        assert_eq!(
            synthesize_address("12", "", "75002", "Paris"),
            "12 (adresse partielle), 75002 Paris"
        );
        assert_eq!(synthesize_address("", "", "", "Lyon"), "(adresse partielle) Lyon");
        assert_eq!(synthesize_address("", "", "", ""), "-");
    }

    // =========================================================================
    // Full parse
    // =========================================================================

    #[test]
    fn test_parse_dataset_dvf_rows() {
        let content = format!(
            "{DVF_HEADER}\n\
             2024-01-15;250000,00;12;RUE DES LILAS;69003;Lyon;Appartement;65;3;;4,85;45,76\n\
             \n\
             15/02/2023;1 200 000;;;69003;Lyon;Maison;180;6,0;900;4.86;45.77\n"
        );
        let ds = parse_dataset(content.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.delimiter, b';');

        let first = &ds.records[0];
        assert_eq!(first.price, Some(250_000.0));
        assert_eq!(first.property_type, "Appartement");
        assert_eq!(first.room_count, Some(3));
        assert_eq!(first.land_area, None);
        assert_eq!(first.longitude, Some(4.85));
        assert_eq!(first.latitude, Some(45.76));
        assert_eq!(first.address, "12 RUE DES LILAS, 69003 Lyon");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 15));

        let second = &ds.records[1];
        assert_eq!(second.price, Some(1_200_000.0));
        assert_eq!(second.room_count, Some(6));
        assert_eq!(second.address, "(adresse partielle), 69003 Lyon");
    }

    #[test]
    fn test_parse_dataset_keeps_unusable_rows() {
        let content = "prix,type,surface,lat,lon,date\n\
                       abc,Maison,100,48.1,2.3,2024-01-01\n\
                       300000,Maison,100,48.1,2.3,not a date\n";
        // "surface" alone is not an alias for living area.
        assert!(matches!(
            parse_dataset(content.as_bytes()),
            Err(DataFormatError::MissingColumns { .. })
        ));

        let content = content.replace("surface,", "surface_habitable,");
        let ds = parse_dataset(content.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].price, None);
        assert_eq!(ds.records[1].date, None);
        assert_eq!(ds.records[1].raw_date, "not a date");
    }

    #[test]
    fn test_parse_dataset_stray_quote_stays_on_its_line() {
        let content = "prix;type;surface_habitable;lat;lon;voie\n\
                       300000;Maison;100;48.85;2.35;\"LES PINS\n\
                       310000;Maison;100;48.85;2.35;RUE B\n\
                       320000;Maison;100;48.85;2.35;RUE C\n";
        let ds = parse_dataset(content.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert!(ds.records[0].address.contains("\"LES PINS"));
        assert_eq!(ds.records[1].price, Some(310_000.0));
        assert_eq!(ds.records[2].address, "RUE C");
    }

    #[test]
    fn test_parse_dataset_too_few_lines() {
        assert!(matches!(
            parse_dataset(b""),
            Err(DataFormatError::TooFewLines { lines: 0, .. })
        ));
        assert!(matches!(
            parse_dataset(format!("{DVF_HEADER}\n\n   \n").as_bytes()),
            Err(DataFormatError::TooFewLines { lines: 1, .. })
        ));
    }

    #[test]
    fn test_parse_dataset_windows_1252_header() {
        let mut bytes = b"Valeur Fonci\xE8re|Type local|Surface r\xE9elle b\xE2ti|Latitude|Longitude\n".to_vec();
        bytes.extend_from_slice(b"300000|Maison|100|48.8|2.3\n");
        let ds = parse_dataset(&bytes).unwrap();
        assert_eq!(ds.encoding, TextEncoding::Windows1252);
        assert_eq!(ds.delimiter, b'|');
        assert_eq!(ds.records[0].living_area, Some(100.0));
    }
}
