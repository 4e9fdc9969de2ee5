//! CSV loader for marketing performance datasets

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ByteRecord, ReaderBuilder};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Column, RawDataset, RawRecord};

/// Load a dataset from a file on disk
pub fn load_path(path: &Path) -> Result<RawDataset> {
    let bytes = fs::read(path)?;
    load_csv(bytes.as_slice())
}

/// Load a dataset from any CSV reader
///
/// Headers are matched against [`Column::aliases`]; unknown columns are
/// ignored. When two headers map to the same column the first one wins.
/// Rows may be ragged: a short row yields missing values. Cells that are
/// not valid UTF-8 are decoded lossily rather than rejecting the file; a
/// numeric cell decoded this way fails to parse and is imputed downstream.
pub fn load_csv<R: Read>(reader: R) -> Result<RawDataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| decode(h).into_owned())
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(Error::Schema("Input has no header row".into()));
    }

    let mapping = resolve_columns(&headers);
    let columns: BTreeSet<Column> = mapping.iter().map(|(_, c)| *c).collect();

    debug!(
        "Resolved {} of {} header columns: {:?}",
        columns.len(),
        headers.len(),
        columns
    );

    let mut records = Vec::new();
    let mut lossy_cells = 0usize;
    for (i, result) in rdr.byte_records().enumerate() {
        let record = result?;
        records.push(to_raw_record(i + 1, &record, &mapping, &mut lossy_cells));
    }

    if lossy_cells > 0 {
        warn!(cells = lossy_cells, "Decoded cells containing invalid UTF-8");
    }
    debug!("Loaded {} raw records", records.len());
    Ok(RawDataset { columns, records })
}

/// Map header positions to canonical columns
fn resolve_columns(headers: &[String]) -> Vec<(usize, Column)> {
    let mut seen = BTreeSet::new();
    let mut mapping = Vec::new();
    for (i, header) in headers.iter().enumerate() {
        if let Some(column) = Column::from_header(header) {
            if seen.insert(column) {
                mapping.push((i, column));
            }
        }
    }
    mapping
}

fn to_raw_record(
    row: usize,
    record: &ByteRecord,
    mapping: &[(usize, Column)],
    lossy_cells: &mut usize,
) -> RawRecord {
    let mut raw = RawRecord::new(row);
    for &(i, column) in mapping {
        if let Some(bytes) = record.get(i) {
            let value = decode(bytes);
            if matches!(value, Cow::Owned(_)) {
                *lossy_cells += 1;
            }
            raw.set(column, &value);
        }
    }
    raw
}

fn decode(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Parse a date string in various common formats
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
        "%d/%m/%Y", // 15/01/2024 (European)
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    // Timestamps such as "2024-01-15 00:00:00" or "2024-01-15T00:00:00Z"
    s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Parse a numeric cell, handling currency symbols, commas and accounting negatives
///
/// Returns `None` for anything that is not a finite number.
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' ', '%'], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
