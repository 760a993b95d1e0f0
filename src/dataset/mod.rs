//! Canonical record store.
//!
//! Loads raw tabular input, resolves publisher-specific headers through the
//! alias table in [`schema`], derives time fields, and drops rows whose award
//! date cannot be parsed (counted, never silently merged into results).

pub mod error;
pub mod record;
pub mod schema;


pub use error::DatasetError;
pub use record::Record;
pub use schema::{ColumnMap, Field};

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::hashing::{Fingerprint, FingerprintBuilder};

/// An immutable, fingerprinted sequence of canonical records.
///
/// A dataset is loaded once per distinct source file and never mutated
/// afterwards, so concurrent read-only queries need no locking.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    fingerprint: Fingerprint,
    rows_dropped_for_bad_date: usize,
}

impl Dataset {
    /// Loads a dataset from a CSV file on disk.
    pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| DatasetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loading dataset");
        Self::load_reader(file)
    }

    /// Loads a dataset from any CSV byte stream.
    pub fn load_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if headers.is_empty() {
            return Err(DatasetError::EmptyInput);
        }

        let columns = ColumnMap::resolve(&headers).map_err(DatasetError::schema)?;
        let year_only_column = ColumnMap::date_is_year_only(&headers);

        let mut builder = FingerprintBuilder::new();
        for header in &headers {
            builder.cell(header);
        }
        builder.end_row();

        let mut records = Vec::new();
        let mut rows_dropped_for_bad_date = 0;
        let mut next_id: u64 = 0;

        for row in csv_reader.records() {
            let row = row?;
            for cell in row.iter() {
                builder.cell(cell);
            }
            builder.end_row();

            let cell = |idx: usize| row.get(idx).unwrap_or("");
            let date_cell = cell(columns.award_date);
            let parsed = if year_only_column {
                parse_year_cell(date_cell)
            } else {
                parse_date_cell(date_cell)
            };

            let (award_date, year_only) = match parsed {
                ParsedDate::Full(date) => (Some(date), None),
                ParsedDate::YearOnly(year) => (None, Some(year)),
                ParsedDate::Empty => (None, None),
                ParsedDate::Invalid => {
                    warn!(
                        row = records.len() + rows_dropped_for_bad_date,
                        value = date_cell,
                        "Dropping row with unparseable award date"
                    );
                    rows_dropped_for_bad_date += 1;
                    continue;
                }
            };

            let region = columns
                .region
                .map(|idx| cell(idx).trim())
                .filter(|v| !v.is_empty())
                .map(String::from);

            let mut record = Record::new(
                next_id,
                cell(columns.title),
                cell(columns.description),
                cell(columns.funder),
                parse_amount(cell(columns.amount)),
                award_date,
                region,
            );
            if let Some(year) = year_only {
                record.set_year_only(year);
            }
            next_id += 1;
            records.push(record);
        }

        let fingerprint = builder.finish();
        info!(
            records = records.len(),
            dropped = rows_dropped_for_bad_date,
            fingerprint = %fingerprint,
            "Dataset loaded"
        );

        Ok(Self {
            records,
            fingerprint,
            rows_dropped_for_bad_date,
        })
    }

    /// Records in original file order.
    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// BLAKE3 fingerprint over header and cell values, the staleness tag for
    /// derived caches.
    #[inline]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Number of rows dropped because their award date failed to parse.
    #[inline]
    pub fn rows_dropped_for_bad_date(&self) -> usize {
        self.rows_dropped_for_bad_date
    }

    /// Number of usable records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no usable records were loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

enum ParsedDate {
    Full(NaiveDate),
    YearOnly(i32),
    Empty,
    Invalid,
}

/// Date formats tolerated by the best-effort parse, most common first.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y-%m-%dT%H:%M:%S",
];

fn parse_date_cell(value: &str) -> ParsedDate {
    let value = value.trim();
    if value.is_empty() {
        return ParsedDate::Empty;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return ParsedDate::Full(date);
        }
    }
    // ISO timestamps with sub-second or zone suffixes: retry the date prefix.
    // get() rather than slicing keeps multi-byte cell values non-fatal.
    if let Some(prefix) = value.get(..10)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        return ParsedDate::Full(date);
    }
    if let Some(year) = parse_year_value(value) {
        return ParsedDate::YearOnly(year);
    }
    ParsedDate::Invalid
}

fn parse_year_cell(value: &str) -> ParsedDate {
    let value = value.trim();
    if value.is_empty() {
        return ParsedDate::Empty;
    }
    match parse_year_value(value) {
        Some(year) => ParsedDate::YearOnly(year),
        None => ParsedDate::Invalid,
    }
}

fn parse_year_value(value: &str) -> Option<i32> {
    // Spreadsheet exports often render years as floats ("2022.0").
    let value = value.strip_suffix(".0").unwrap_or(value);
    let year: i32 = value.parse().ok()?;
    (1000..=9999).contains(&year).then_some(year)
}

/// Best-effort numeric parse tolerant of currency formatting ("£5,000.00").
/// Unparseable amounts become 0 rather than dropping the row.
fn parse_amount(value: &str) -> f64 {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse::<f64>().unwrap_or(0.0).max(0.0)
}
