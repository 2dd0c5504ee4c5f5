//! Reader for investing.com historical price exports.
//!
//! The Portuguese-locale export looks like
//!
//! ```text
//! "Data","Último","Abertura","Máxima","Mínima","Vol.","Var%"
//! "15.05.2024","82,75","82,38","83,10","81,05","263,88K","0,45%"
//! ```
//!
//! Only the date and closing price columns are read. Rows arrive newest
//! first and are returned ascending.

use crate::core::data::{Observation, TimeSeriesData};
use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;

/// Column names and formats of the input table.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvFormat {
    pub date_column: String,
    pub price_column: String,
    pub date_format: String,
    pub delimiter: u8,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            date_column: "Data".to_string(),
            price_column: "Último".to_string(),
            date_format: "%d.%m.%Y".to_string(),
            delimiter: b',',
        }
    }
}

/// Parse a price written with a decimal comma (`85,32`). When a comma is
/// present any `.` is a thousands separator and is dropped (`1.234,50`).
/// Plain `85.32` is accepted as well.
pub fn parse_price(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let normalized = if raw.contains(',') {
        raw.replace('.', "").replace(',', ".")
    } else {
        raw.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn column_index(headers: &csv::StringRecord, name: &str) -> crate::Result<usize> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        .ok_or_else(|| {
            crate::SeerError::DataValidation(format!(
                "column '{}' not found (have: {})",
                name,
                headers.iter().collect::<Vec<_>>().join(", ")
            ))
        })
}

/// Read a price table from any reader.
pub fn read_prices<R: Read>(reader: R, format: &CsvFormat) -> crate::Result<TimeSeriesData> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let date_idx = column_index(&headers, &format.date_column)?;
    let price_idx = column_index(&headers, &format.price_column)?;

    let mut observations = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        // header is line 1
        let line = row + 2;
        let raw_date = record.get(date_idx).unwrap_or_default();
        let raw_price = record.get(price_idx).unwrap_or_default();

        let date = NaiveDate::parse_from_str(raw_date, &format.date_format).map_err(|e| {
            crate::SeerError::DataValidation(format!(
                "line {}: cannot parse date '{}': {}",
                line, raw_date, e
            ))
        })?;
        let value = parse_price(raw_price)
            .filter(|v| *v > 0.0)
            .ok_or_else(|| {
                crate::SeerError::DataValidation(format!(
                    "line {}: price '{}' is not a positive number",
                    line, raw_price
                ))
            })?;
        observations.push(Observation::new(date, value));
    }

    observations.sort_by_key(|o| o.date);
    if let Some(w) = observations.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(crate::SeerError::DataValidation(format!(
            "duplicate date {}",
            w[0].date
        )));
    }

    tracing::info!(
        rows = observations.len(),
        first = ?observations.first().map(|o| o.date),
        last = ?observations.last().map(|o| o.date),
        "loaded price history"
    );
    TimeSeriesData::from_observations(&observations)
}

/// Read a price table from a file.
pub fn load_prices(path: &Path, format: &CsvFormat) -> crate::Result<TimeSeriesData> {
    let file = std::fs::File::open(path)?;
    read_prices(std::io::BufReader::new(file), format)
}
