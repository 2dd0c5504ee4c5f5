// src/lib.rs - library root: error type and public surface

pub mod config;
pub mod core;
pub mod report;
pub mod service;
pub mod validate;

pub use self::core::{
    ForecastPoint, ForecastResult, HolidayCalendar, HolidayConfig, Metrics, Observation, Seer,
    TimeSeriesData, TrendType,
};
pub use service::{FittedForecast, ForecastService, Prediction, TrendModel, Unavailable};

pub type Result<T> = std::result::Result<T, SeerError>;

#[derive(Debug, thiserror::Error)]
pub enum SeerError {
    #[error("Data validation error: {0}")]
    DataValidation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid date '{0}': expected DD-MM-YYYY")]
    InvalidDate(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Optimization error: {0}")]
    Optimization(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
