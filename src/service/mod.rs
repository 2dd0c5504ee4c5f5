//! Forecast service: fits a trend model to a price history and answers
//! full-curve and single-date requests.
//!
//! The model is created through a factory for every fit, with the holiday
//! table registered as a holiday component. Weekend and holiday target dates
//! are answered without touching the model. Fits are cached by a fingerprint
//! of their inputs, so repeated requests over the same history reuse one fit.

pub mod cache;

pub use cache::{fingerprint, FitCache};

use crate::core::{ForecastResult, HolidayCalendar, HolidayConfig, Seer, TimeSeriesData};
use crate::Result;
use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::sync::Arc;

/// The fit/predict capability the service depends on.
pub trait TrendModel {
    fn add_holidays(&mut self, config: HolidayConfig) -> Result<()>;
    fn fit(&mut self, data: &TimeSeriesData) -> Result<()>;
    fn make_future_dates(&self, periods: usize, include_history: bool) -> Result<Vec<NaiveDate>>;
    fn predict(&self, ds: &[NaiveDate]) -> Result<ForecastResult>;
}

impl TrendModel for Seer {
    fn add_holidays(&mut self, config: HolidayConfig) -> Result<()> {
        Seer::add_holidays(self, config)
    }

    fn fit(&mut self, data: &TimeSeriesData) -> Result<()> {
        Seer::fit(self, data)
    }

    fn make_future_dates(&self, periods: usize, include_history: bool) -> Result<Vec<NaiveDate>> {
        Seer::make_future_dates(self, periods, include_history)
    }

    fn predict(&self, ds: &[NaiveDate]) -> Result<ForecastResult> {
        Seer::predict(self, ds)
    }
}

/// Knobs of the service itself; model knobs live in the factory.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    /// Calendar days forecast past the last observation.
    pub horizon_days: usize,
    pub holiday_name: String,
    pub lower_window: i32,
    pub upper_window: i32,
    pub cache_enabled: bool,
    /// Fits kept at once; older ones are evicted as new histories arrive.
    pub cache_capacity: usize,
    /// Describes the factory's model configuration. Part of the cache key,
    /// so two services with differently configured models never share fits.
    pub model_tag: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            horizon_days: 365,
            holiday_name: "uk_holidays".to_string(),
            lower_window: 0,
            upper_window: 1,
            cache_enabled: true,
            cache_capacity: cache::DEFAULT_CAPACITY,
            model_tag: String::new(),
        }
    }
}

/// A fitted model together with its forecast over history plus horizon.
#[derive(Debug)]
pub struct FittedForecast<M> {
    pub model: M,
    pub forecast: ForecastResult,
    pub fingerprint: String,
}

/// Why no value is reported for a target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    Weekend,
    Holiday,
    /// The date is a trading day but the forecast has no row for it.
    OutsideHorizon,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::Weekend => write!(f, "weekend"),
            Unavailable::Holiday => write!(f, "holiday"),
            Unavailable::OutsideHorizon => write!(f, "outside forecast range"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    Value(f64),
    Unavailable(Unavailable),
}

impl Prediction {
    pub fn value(&self) -> Option<f64> {
        match self {
            Prediction::Value(v) => Some(*v),
            Prediction::Unavailable(_) => None,
        }
    }
}

pub struct ForecastService<M, F> {
    factory: F,
    holidays: Arc<HolidayCalendar>,
    settings: ServiceSettings,
    cache: FitCache<M>,
}

impl<M, F> ForecastService<M, F>
where
    M: TrendModel,
    F: Fn() -> M,
{
    pub fn new(factory: F, holidays: Arc<HolidayCalendar>, settings: ServiceSettings) -> Self {
        Self {
            factory,
            holidays,
            cache: FitCache::new(settings.cache_capacity),
            settings,
        }
    }

    pub fn holidays(&self) -> &HolidayCalendar {
        &self.holidays
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn cache(&self) -> &FitCache<M> {
        &self.cache
    }

    /// Forget every cached fit.
    pub fn invalidate(&self) {
        let removed = self.cache.invalidate();
        tracing::info!(removed, "fit cache invalidated");
    }

    /// Fit a fresh model to `series` and forecast the history plus
    /// `horizon_days` daily steps.
    pub fn forecast_full(&self, series: &TimeSeriesData) -> Result<Arc<FittedForecast<M>>> {
        if series.len() < 2 || series.first_date() == series.last_date() {
            return Err(crate::SeerError::InvalidInput(format!(
                "need at least 2 observations on distinct dates, got {}",
                series.len()
            )));
        }

        let key = fingerprint(series, &self.holidays, &self.settings);
        if self.settings.cache_enabled {
            if let Some(hit) = self.cache.get(&key) {
                tracing::debug!(fingerprint = %&key[..12], "fit cache hit");
                return Ok(hit);
            }
        }

        let start = std::time::Instant::now();
        let mut model = (self.factory)();
        model.add_holidays(
            HolidayConfig::new(&self.settings.holiday_name, self.holidays.dates())
                .with_windows(self.settings.lower_window, self.settings.upper_window),
        )?;
        model.fit(series)?;
        let dates = model.make_future_dates(self.settings.horizon_days, true)?;
        let forecast = model.predict(&dates)?;

        tracing::info!(
            observations = series.len(),
            forecast_rows = forecast.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            fingerprint = %&key[..12],
            "model fitted"
        );

        let fitted = Arc::new(FittedForecast {
            model,
            forecast,
            fingerprint: key,
        });
        if self.settings.cache_enabled {
            self.cache.insert(Arc::clone(&fitted));
        }
        Ok(fitted)
    }

    /// Predicted value for `target`, or the reason there is none.
    ///
    /// Weekends and exact holiday dates are answered without building a
    /// model; the returned fit is `None` in that case.
    pub fn forecast_at(
        &self,
        series: &TimeSeriesData,
        target: NaiveDate,
    ) -> Result<(Option<Arc<FittedForecast<M>>>, Prediction)> {
        if let Some(reason) = self.closed_reason(target) {
            tracing::info!(%target, %reason, "no prediction for non-trading day");
            return Ok((None, Prediction::Unavailable(reason)));
        }

        let fitted = self.forecast_full(series)?;
        let prediction = match fitted.forecast.lookup(target) {
            Some(point) => Prediction::Value(point.yhat),
            None => {
                tracing::info!(%target, reason = %Unavailable::OutsideHorizon, "no forecast row");
                Prediction::Unavailable(Unavailable::OutsideHorizon)
            }
        };
        Ok((Some(fitted), prediction))
    }

    fn closed_reason(&self, date: NaiveDate) -> Option<Unavailable> {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            Some(Unavailable::Weekend)
        } else if self.holidays.contains(date) {
            Some(Unavailable::Holiday)
        } else {
            None
        }
    }
}
