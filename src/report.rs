//! User-facing text and forecast export.

use crate::core::{ForecastResult, HolidayCalendar, Metrics};
use crate::service::Prediction;
use crate::validate::format_target_date;
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

pub const INVALID_DATE_MESSAGE: &str =
    "Invalid date. Please enter the date in DD-MM-YYYY format.";

pub const NO_FORECAST_MESSAGE: &str = "Forecasts are not available yet.";

/// The answer to a single-date request. All unavailable reasons read the
/// same to the user.
pub fn prediction_message(target: NaiveDate, prediction: &Prediction) -> String {
    let date = format_target_date(target);
    match prediction {
        Prediction::Value(v) => format!("Predicted value for {}: {:.2}", date, v),
        Prediction::Unavailable(_) => format!(
            "{} falls on a weekend or holiday. No prediction is available for this date.",
            date
        ),
    }
}

const METRIC_NOTES: [(&str, &str); 4] = [
    (
        "MAE (Mean Absolute Error)",
        "average absolute gap between forecast and observed price; lower is better.",
    ),
    (
        "MSE (Mean Squared Error)",
        "average squared gap; weighs large misses more heavily; lower is better.",
    ),
    (
        "RMSE (Root Mean Squared Error)",
        "square root of MSE, in the units of the price.",
    ),
    (
        "MAPE (Mean Absolute Percentage Error)",
        "average absolute gap relative to the observed price, as a fraction; lower is better.",
    ),
];

pub fn metrics_report(metrics: &Metrics) -> String {
    let mut out = String::from("Model evaluation\n");
    for (name, note) in METRIC_NOTES {
        let _ = writeln!(out, "  - {}: {}", name, note);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  MAE:  {:.2}", metrics.mae);
    let _ = writeln!(out, "  MSE:  {:.2}", metrics.mse);
    let _ = writeln!(out, "  RMSE: {:.2}", metrics.rmse);
    let _ = writeln!(out, "  MAPE: {:.2}", metrics.mape);
    let _ = write!(out, "  ({} observations)", metrics.n);
    out
}

pub fn holiday_listing(calendar: &HolidayCalendar, year: Option<i32>) -> String {
    let rows: Vec<(NaiveDate, &str)> = match year {
        Some(y) => calendar.in_year(y).collect(),
        None => calendar.iter().collect(),
    };
    let mut out = String::new();
    for (date, name) in rows {
        let _ = writeln!(out, "{}  {}  {}", format_target_date(date), date.format("%a"), name);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Chosen by file extension: `.json` is JSON, anything else CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

/// One CSV row per forecast date.
pub fn write_forecast_csv<W: Write>(writer: W, forecast: &ForecastResult) -> crate::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for point in forecast.points() {
        csv.serialize(point)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_forecast_json<W: Write>(mut writer: W, forecast: &ForecastResult) -> crate::Result<()> {
    let points: Vec<_> = forecast.points().collect();
    serde_json::to_writer_pretty(&mut writer, &points)?;
    writer.flush()?;
    Ok(())
}

pub fn export_forecast(path: &Path, forecast: &ForecastResult) -> crate::Result<()> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    let format = ExportFormat::from_path(path);
    match format {
        ExportFormat::Csv => write_forecast_csv(file, forecast)?,
        ExportFormat::Json => write_forecast_json(file, forecast)?,
    }
    tracing::info!(path = %path.display(), rows = forecast.len(), ?format, "forecast exported");
    Ok(())
}
