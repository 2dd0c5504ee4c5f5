use crate::core::data::{ForecastResult, TimeSeriesData};
use crate::core::optimizer::{optimize, MapProblem, OptimizationConfig, Prior};
use crate::core::seasonality::{fourier_series, holiday_features, hstack};
use crate::core::trend::{
    changepoint_matrix, days_since, flat_trend, future_dates, future_trend_sd, ols_linear_trend,
    piecewise_linear, scale_dates, select_changepoints, time_scale,
};
use crate::Result;
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Prior sd of the base growth rate and offset.
const TREND_PRIOR_SD: f64 = 5.0;
/// Yearly seasonality is only fitted on at least this many days of history.
const MIN_YEARLY_SPAN_DAYS: f64 = 730.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendType {
    Linear,
    Flat,
}

/// Configuration for a holiday component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolidayConfig {
    pub name: String,
    pub dates: Vec<NaiveDate>,
    pub lower_window: i32, // Days before holiday to include (<= 0)
    pub upper_window: i32, // Days after holiday to include
    pub prior_scale: f64,
}

impl HolidayConfig {
    pub fn new(name: &str, dates: Vec<NaiveDate>) -> Self {
        Self {
            name: name.to_string(),
            dates,
            lower_window: 0,
            upper_window: 0,
            prior_scale: 10.0,
        }
    }

    pub fn with_windows(mut self, lower: i32, upper: i32) -> Self {
        self.lower_window = lower;
        self.upper_window = upper;
        self
    }

    pub fn with_prior_scale(mut self, scale: f64) -> Self {
        self.prior_scale = scale;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SeasonBlock {
    name: String,
    period: f64,
    order: usize,
    start: usize,
    end: usize, // exclusive
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HolidayBlock {
    name: String,
    config: usize, // index into Seer::holidays
    start: usize,
    end: usize,
}

/// Everything learnt by `fit`, in the model's scaled units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedParams {
    pub t0: NaiveDate,
    pub span_days: f64,
    pub y_scale: f64,
    pub t_change: Vec<f64>,
    pub k: f64,
    pub m: f64,
    pub delta: Vec<f64>,
    /// Seasonality coefficients, block by block.
    pub beta: Vec<f64>,
    /// Holiday coefficients, one per window offset.
    pub gamma: Vec<f64>,
    pub sigma_obs: f64,
    pub neg_log_prob: f64,
    pub iterations: u64,
    pub converged: bool,
    season_blocks: Vec<SeasonBlock>,
    holiday_blocks: Vec<HolidayBlock>,
}

/// z-scores of the supported two-sided interval widths.
const Z_SCORES: [(f64, f64); 5] = [
    (0.5, 0.6745),
    (0.8, 1.2816),
    (0.9, 1.6449),
    (0.95, 1.9600),
    (0.99, 2.5758),
];

fn z_score(width: f64) -> Result<f64> {
    Z_SCORES
        .iter()
        .find(|(w, _)| (w - width).abs() < 1e-9)
        .map(|(_, z)| *z)
        .ok_or_else(|| {
            crate::SeerError::DataValidation(format!(
                "interval_width must be one of 0.5, 0.8, 0.9, 0.95, 0.99, got {}",
                width
            ))
        })
}

/// Additive decomposition model: piecewise linear trend, Fourier
/// seasonalities and holiday offsets, fitted by MAP estimation.
///
/// A model is fitted once. Holidays must be registered before `fit`.
#[derive(Debug, Clone)]
pub struct Seer {
    trend: TrendType,
    n_changepoints: usize,
    changepoint_range: f64,
    changepoint_prior_scale: f64,
    seasonality_prior_scale: f64,
    yearly_seasonality: bool,
    weekly_seasonality: bool,
    interval_width: f64,
    holidays: Vec<HolidayConfig>,
    optimization: OptimizationConfig,

    history: Option<TimeSeriesData>,
    params: Option<FittedParams>,
}

impl Seer {
    pub fn new() -> Self {
        Self {
            trend: TrendType::Linear,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly_seasonality: true,
            weekly_seasonality: true,
            interval_width: 0.80,
            holidays: Vec::new(),
            optimization: OptimizationConfig::default(),
            history: None,
            params: None,
        }
    }

    pub fn with_trend(mut self, trend: TrendType) -> Self {
        self.trend = trend;
        self
    }

    pub fn with_changepoints(mut self, n: usize) -> Self {
        self.n_changepoints = n;
        self
    }

    pub fn with_changepoint_range(mut self, range: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&range) {
            return Err(crate::SeerError::DataValidation(format!(
                "changepoint_range must be between 0 and 1, got {}",
                range
            )));
        }
        self.changepoint_range = range;
        Ok(self)
    }

    pub fn with_changepoint_prior_scale(mut self, scale: f64) -> Result<Self> {
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(crate::SeerError::DataValidation(format!(
                "changepoint_prior_scale must be positive, got {}",
                scale
            )));
        }
        self.changepoint_prior_scale = scale;
        Ok(self)
    }

    pub fn with_interval_width(mut self, width: f64) -> Result<Self> {
        z_score(width)?;
        self.interval_width = width;
        Ok(self)
    }

    pub fn without_yearly_seasonality(mut self) -> Self {
        self.yearly_seasonality = false;
        self
    }

    pub fn without_weekly_seasonality(mut self) -> Self {
        self.weekly_seasonality = false;
        self
    }

    pub fn with_optimization_config(mut self, config: OptimizationConfig) -> Self {
        self.optimization = config;
        self
    }

    pub fn n_changepoints(&self) -> usize {
        self.n_changepoints
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    pub fn params(&self) -> Option<&FittedParams> {
        self.params.as_ref()
    }

    /// Register a holiday table. Each offset in the window gets its own
    /// coefficient, shared by every date in the table.
    pub fn add_holidays(&mut self, config: HolidayConfig) -> Result<()> {
        if self.is_fitted() {
            return Err(crate::SeerError::InvalidInput(
                "holidays must be added before fitting".to_string(),
            ));
        }
        if self.holidays.iter().any(|h| h.name == config.name) {
            return Err(crate::SeerError::DataValidation(format!(
                "holiday table '{}' already exists",
                config.name
            )));
        }
        if config.lower_window > 0 || config.upper_window < 0 {
            return Err(crate::SeerError::DataValidation(format!(
                "holiday windows must satisfy lower <= 0 <= upper, got ({}, {})",
                config.lower_window, config.upper_window
            )));
        }
        if !(config.prior_scale > 0.0 && config.prior_scale.is_finite()) {
            return Err(crate::SeerError::DataValidation(format!(
                "holiday prior_scale must be positive, got {}",
                config.prior_scale
            )));
        }
        tracing::debug!(
            name = %config.name,
            dates = config.dates.len(),
            lower = config.lower_window,
            upper = config.upper_window,
            "registered holiday table"
        );
        self.holidays.push(config);
        Ok(())
    }

    pub fn fit(&mut self, data: &TimeSeriesData) -> Result<()> {
        if self.is_fitted() {
            return Err(crate::SeerError::InvalidInput(
                "model is already fitted; build a new one to refit".to_string(),
            ));
        }
        if data.len() < 2 {
            return Err(crate::SeerError::InvalidInput(format!(
                "need at least 2 observations to fit, got {}",
                data.len()
            )));
        }

        // Time scaling t in [0,1]
        let (t_hist, span_days, t0) = time_scale(&data.ds);
        if span_days < 1.0 {
            return Err(crate::SeerError::InvalidInput(
                "history spans zero days".to_string(),
            ));
        }
        let t_days = days_since(&data.ds, t0);

        let y_scale = data.y.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let y_scaled: Vec<f64> = data.y.iter().map(|v| v / y_scale).collect();

        let t_change = match self.trend {
            TrendType::Linear => {
                select_changepoints(&t_hist, self.n_changepoints, self.changepoint_range)
            }
            TrendType::Flat => Vec::new(),
        };

        // Trend block, with its priors
        let mut blocks: Vec<Vec<Vec<f64>>> = Vec::new();
        let mut priors: Vec<Prior> = Vec::new();
        match self.trend {
            TrendType::Linear => {
                let a = changepoint_matrix(&t_hist, &t_change);
                let rows = t_hist
                    .iter()
                    .zip(&a)
                    .map(|(&t, a_row)| {
                        let mut row = vec![t, 1.0];
                        row.extend(
                            a_row
                                .iter()
                                .zip(&t_change)
                                .map(|(&aij, &tc)| aij * (t - tc)),
                        );
                        row
                    })
                    .collect();
                blocks.push(rows);
                priors.extend([Prior::Normal(TREND_PRIOR_SD); 2]);
                priors.extend(vec![Prior::Laplace(self.changepoint_prior_scale); t_change.len()]);
            }
            TrendType::Flat => {
                blocks.push(vec![vec![1.0]; data.len()]);
                priors.push(Prior::Normal(TREND_PRIOR_SD));
            }
        }
        let n_trend = priors.len();

        let mut seasonalities: Vec<(&str, f64, usize)> = Vec::new();
        if self.yearly_seasonality {
            if span_days >= MIN_YEARLY_SPAN_DAYS {
                seasonalities.push(("yearly", 365.25, 10));
            } else {
                tracing::info!(
                    span_days,
                    "history shorter than two years, yearly seasonality disabled"
                );
            }
        }
        if self.weekly_seasonality {
            seasonalities.push(("weekly", 7.0, 3));
        }

        let mut col = 0usize;
        let mut season_blocks = Vec::new();
        for (name, period, order) in seasonalities {
            let features = fourier_series(&t_days, period, order);
            season_blocks.push(SeasonBlock {
                name: name.to_string(),
                period,
                order,
                start: col,
                end: col + 2 * order,
            });
            col += 2 * order;
            priors.extend(vec![Prior::Normal(self.seasonality_prior_scale); 2 * order]);
            blocks.push(features);
        }
        let n_season = col;

        col = 0;
        let mut holiday_blocks = Vec::new();
        for (idx, config) in self.holidays.iter().enumerate() {
            let features = holiday_features(
                &data.ds,
                &config.dates,
                config.lower_window,
                config.upper_window,
            );
            let width = features.first().map_or(0, Vec::len);
            if width == 0 {
                continue;
            }
            let active = features.iter().filter(|r| r.iter().any(|&v| v != 0.0)).count();
            if active == 0 {
                tracing::warn!(name = %config.name, "no holiday falls inside the history");
            }
            holiday_blocks.push(HolidayBlock {
                name: config.name.clone(),
                config: idx,
                start: col,
                end: col + width,
            });
            col += width;
            priors.extend(vec![Prior::Normal(config.prior_scale); width]);
            blocks.push(features);
        }
        let n_holiday = col;

        let rows = hstack(&blocks);
        let n_cols = priors.len();
        let x = Array2::from_shape_vec(
            (data.len(), n_cols),
            rows.into_iter().flatten().collect(),
        )
        .map_err(|e| crate::SeerError::DataValidation(format!("design matrix: {}", e)))?;

        // Start from the least-squares line through the scaled history
        let mut init = vec![0.0; n_cols + 1];
        let (k0, m0) = ols_linear_trend(&t_hist, &y_scaled);
        match self.trend {
            TrendType::Linear => {
                init[0] = k0;
                init[1] = m0;
            }
            TrendType::Flat => {
                init[0] = y_scaled.iter().sum::<f64>() / y_scaled.len() as f64;
            }
        }
        let resid_var = t_hist
            .iter()
            .zip(&y_scaled)
            .map(|(t, y)| (y - (k0 * t + m0)).powi(2))
            .sum::<f64>()
            / y_scaled.len() as f64;
        init[n_cols] = resid_var.sqrt().max(1e-3).ln();

        tracing::debug!(
            rows = data.len(),
            trend_cols = n_trend,
            season_cols = n_season,
            holiday_cols = n_holiday,
            changepoints = t_change.len(),
            "fitting model"
        );

        let problem = MapProblem::new(x, Array1::from_vec(y_scaled), priors)?;
        let result = optimize(problem, init, &self.optimization)?;
        if !result.converged {
            tracing::warn!(
                iterations = result.iterations,
                "optimizer hit the iteration limit"
            );
        }

        let coef = result.coefficients();
        let (k, m, delta) = match self.trend {
            TrendType::Linear => (coef[0], coef[1], coef[2..n_trend].to_vec()),
            TrendType::Flat => (0.0, coef[0], Vec::new()),
        };
        let beta = coef[n_trend..n_trend + n_season].to_vec();
        let gamma = coef[n_trend + n_season..].to_vec();

        self.params = Some(FittedParams {
            t0,
            span_days,
            y_scale,
            t_change,
            k,
            m,
            delta,
            beta,
            gamma,
            sigma_obs: result.sigma_obs(),
            neg_log_prob: result.neg_log_prob,
            iterations: result.iterations,
            converged: result.converged,
            season_blocks,
            holiday_blocks,
        });
        self.history = Some(data.clone());
        Ok(())
    }

    fn fitted(&self) -> Result<(&FittedParams, &TimeSeriesData)> {
        match (&self.params, &self.history) {
            (Some(p), Some(h)) => Ok((p, h)),
            _ => Err(crate::SeerError::Prediction(
                "Model must be fitted before predicting".to_string(),
            )),
        }
    }

    /// Daily dates after the history, optionally preceded by the history
    /// dates themselves.
    pub fn make_future_dates(
        &self,
        periods: usize,
        include_history: bool,
    ) -> Result<Vec<NaiveDate>> {
        let (_, history) = self.fitted()?;
        let last = history.last_date().ok_or_else(|| {
            crate::SeerError::Prediction("fitted history is empty".to_string())
        })?;

        let future = future_dates(last, periods)?;
        if !include_history {
            return Ok(future);
        }
        let mut out = Vec::with_capacity(history.len() + future.len());
        out.extend_from_slice(&history.ds);
        out.extend(future);
        Ok(out)
    }

    pub fn predict(&self, ds: &[NaiveDate]) -> Result<ForecastResult> {
        let (p, _) = self.fitted()?;
        let n = ds.len();
        let t = scale_dates(ds, p.t0, p.span_days);
        let t_days = days_since(ds, p.t0);

        let trend = match self.trend {
            TrendType::Linear => {
                let a = changepoint_matrix(&t, &p.t_change);
                piecewise_linear(p.k, p.m, &p.delta, &t, &a, &p.t_change)
            }
            TrendType::Flat => flat_trend(p.m, n),
        };

        let mut yearly = vec![0.0; n];
        let mut weekly = vec![0.0; n];
        for block in &p.season_blocks {
            let features = fourier_series(&t_days, block.period, block.order);
            let target = match block.name.as_str() {
                "yearly" => &mut yearly,
                _ => &mut weekly,
            };
            add_product(target, &features, &p.beta[block.start..block.end]);
        }

        let mut holidays = vec![0.0; n];
        for block in &p.holiday_blocks {
            let config = &self.holidays[block.config];
            let features =
                holiday_features(ds, &config.dates, config.lower_window, config.upper_window);
            add_product(&mut holidays, &features, &p.gamma[block.start..block.end]);
        }

        let scale = |v: Vec<f64>| -> Vec<f64> { v.into_iter().map(|x| x * p.y_scale).collect() };
        let trend = scale(trend);
        let yearly = scale(yearly);
        let weekly = scale(weekly);
        let holidays = scale(holidays);
        let yhat: Vec<f64> = (0..n)
            .map(|i| trend[i] + yearly[i] + weekly[i] + holidays[i])
            .collect();

        // Observation noise everywhere, plus trend drift past the history
        let z = z_score(self.interval_width)?;
        let rate = p.t_change.len() as f64;
        let drift_scale = if p.delta.is_empty() {
            0.0
        } else {
            p.delta.iter().map(|d| d.abs()).sum::<f64>() / p.delta.len() as f64
        };
        let margins: Vec<f64> = t
            .iter()
            .map(|&ti| {
                let trend_sd = future_trend_sd(ti, rate, drift_scale);
                z * (p.sigma_obs.powi(2) + trend_sd.powi(2)).sqrt() * p.y_scale
            })
            .collect();

        Ok(ForecastResult {
            ds: ds.to_vec(),
            yhat_lower: yhat.iter().zip(&margins).map(|(y, m)| y - m).collect(),
            yhat_upper: yhat.iter().zip(&margins).map(|(y, m)| y + m).collect(),
            yhat,
            trend,
            yearly,
            weekly,
            holidays,
        })
    }

    /// Serialize the model settings and fitted parameters to JSON.
    pub fn to_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            trend: TrendType,
            n_changepoints: usize,
            changepoint_range: f64,
            changepoint_prior_scale: f64,
            seasonality_prior_scale: f64,
            interval_width: f64,
            holidays: Vec<HolidaySummary<'a>>,
            history_start: Option<NaiveDate>,
            history_end: Option<NaiveDate>,
            params: Option<&'a FittedParams>,
        }
        #[derive(Serialize)]
        struct HolidaySummary<'a> {
            name: &'a str,
            dates: usize,
            lower_window: i32,
            upper_window: i32,
            prior_scale: f64,
        }

        let snapshot = Snapshot {
            trend: self.trend,
            n_changepoints: self.n_changepoints,
            changepoint_range: self.changepoint_range,
            changepoint_prior_scale: self.changepoint_prior_scale,
            seasonality_prior_scale: self.seasonality_prior_scale,
            interval_width: self.interval_width,
            holidays: self
                .holidays
                .iter()
                .map(|h| HolidaySummary {
                    name: &h.name,
                    dates: h.dates.len(),
                    lower_window: h.lower_window,
                    upper_window: h.upper_window,
                    prior_scale: h.prior_scale,
                })
                .collect(),
            history_start: self.history.as_ref().and_then(TimeSeriesData::first_date),
            history_end: self.history.as_ref().and_then(TimeSeriesData::last_date),
            params: self.params.as_ref(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }
}

/// out[i] += features[i] · coef
fn add_product(out: &mut [f64], features: &[Vec<f64>], coef: &[f64]) {
    for (o, row) in out.iter_mut().zip(features) {
        *o += row.iter().zip(coef).map(|(x, c)| x * c).sum::<f64>();
    }
}

impl Default for Seer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Series with a small deterministic wiggle so the residuals never vanish.
    fn daily_series(
        start: NaiveDate,
        n: usize,
        f: impl Fn(usize, NaiveDate) -> f64,
    ) -> TimeSeriesData {
        let ds: Vec<NaiveDate> = (0..n).map(|i| start + Duration::days(i as i64)).collect();
        let y = ds
            .iter()
            .enumerate()
            .map(|(i, &date)| f(i, date) + 0.2 * (i as f64 * 1.7).sin())
            .collect();
        TimeSeriesData::new(ds, y).unwrap()
    }

    #[test]
    fn test_builder_validation() {
        assert!(Seer::new().with_changepoint_range(1.5).is_err());
        assert!(Seer::new().with_changepoint_prior_scale(0.0).is_err());
        assert!(Seer::new().with_interval_width(0.77).is_err());
        let model = Seer::new().with_interval_width(0.95).unwrap();
        assert_eq!(model.interval_width(), 0.95);
    }

    #[test]
    fn test_fit_rejects_short_history() {
        let data = TimeSeriesData::new(vec![d(2024, 1, 1)], vec![80.0]).unwrap();
        let err = Seer::new().fit(&data).unwrap_err();
        assert!(matches!(err, crate::SeerError::InvalidInput(_)));

        let empty = TimeSeriesData::new(vec![], vec![]).unwrap();
        assert!(Seer::new().fit(&empty).is_err());
    }

    #[test]
    fn test_predict_before_fit() {
        let model = Seer::new();
        assert!(model.predict(&[d(2024, 1, 1)]).is_err());
        assert!(model.make_future_dates(10, true).is_err());
    }

    #[test]
    fn test_fit_only_once() {
        let data = daily_series(d(2024, 1, 1), 60, |i, _| 70.0 + i as f64 * 0.1);
        let mut model = Seer::new();
        model.fit(&data).unwrap();
        assert!(model.fit(&data).is_err());
        assert!(model
            .add_holidays(HolidayConfig::new("late", vec![d(2024, 1, 5)]))
            .is_err());
    }

    #[test]
    fn test_recovers_trend_and_weekly_pattern() {
        let data = daily_series(d(2023, 1, 2), 400, |i, date| {
            let weekly = match date.weekday().num_days_from_monday() {
                5 | 6 => -2.0,
                _ => 0.8,
            };
            60.0 + 0.03 * i as f64 + weekly
        });
        let mut model = Seer::new();
        model.fit(&data).unwrap();

        let forecast = model.predict(&data.ds).unwrap();
        let mape = crate::core::metrics::mape(&data.y, &forecast.yhat).unwrap();
        assert!(mape < 0.01, "in-sample MAPE {}", mape);

        // under two years of history: no yearly term
        assert!(forecast.yearly.iter().all(|&v| v == 0.0));
        // weekend effect is negative, weekday positive
        let sat = data
            .ds
            .iter()
            .position(|dt| dt.weekday().num_days_from_monday() == 5)
            .unwrap();
        assert!(forecast.weekly[sat] < forecast.weekly[sat - 3]);
    }

    #[test]
    fn test_holiday_effect_is_learnt() {
        let holidays = vec![d(2023, 3, 15), d(2023, 6, 14), d(2023, 9, 13), d(2023, 12, 13)];
        let data = daily_series(d(2023, 1, 1), 365, |_, date| {
            if holidays.contains(&date) {
                90.0
            } else if holidays.contains(&(date - Duration::days(1))) {
                85.0
            } else {
                80.0
            }
        });
        let mut model = Seer::new().without_weekly_seasonality();
        model
            .add_holidays(HolidayConfig::new("events", holidays.clone()).with_windows(0, 1))
            .unwrap();
        model.fit(&data).unwrap();

        let forecast = model
            .predict(&[d(2023, 6, 14), d(2023, 6, 15), d(2023, 6, 20)])
            .unwrap();
        assert!((forecast.holidays[0] - 10.0).abs() < 1.5, "{:?}", forecast.holidays);
        assert!((forecast.holidays[1] - 5.0).abs() < 1.5, "{:?}", forecast.holidays);
        assert_eq!(forecast.holidays[2], 0.0);
    }

    #[test]
    fn test_forecast_bounds_widen_past_history() {
        let data = daily_series(d(2022, 1, 1), 300, |i, _| {
            70.0 + (i as f64 * 0.3).sin() + 0.01 * i as f64
        });
        let mut model = Seer::new();
        model.fit(&data).unwrap();

        let dates = model.make_future_dates(90, true).unwrap();
        assert_eq!(dates.len(), 390);
        assert_eq!(dates[300], d(2022, 1, 1) + Duration::days(300));

        let forecast = model.predict(&dates).unwrap();
        for i in 0..forecast.len() {
            assert!(forecast.yhat_lower[i] <= forecast.yhat[i]);
            assert!(forecast.yhat[i] <= forecast.yhat_upper[i]);
        }
        let width = |i: usize| forecast.yhat_upper[i] - forecast.yhat_lower[i];
        assert!(width(389) >= width(299));
    }

    #[test]
    fn test_flat_trend() {
        let data = daily_series(d(2024, 1, 1), 50, |_, _| 42.0);
        let mut model = Seer::new()
            .with_trend(TrendType::Flat)
            .without_weekly_seasonality();
        model.fit(&data).unwrap();

        let forecast = model.predict(&[d(2024, 6, 1)]).unwrap();
        assert!((forecast.trend[0] - 42.0).abs() < 0.5);
        assert!(model.params().unwrap().delta.is_empty());
    }

    #[test]
    fn test_to_json_contains_params() {
        let data = daily_series(d(2024, 1, 1), 30, |i, _| 50.0 + i as f64);
        let mut model = Seer::new();
        model.fit(&data).unwrap();

        let json: serde_json::Value = serde_json::from_str(&model.to_json().unwrap()).unwrap();
        assert_eq!(json["trend"], "Linear");
        assert!(json["params"]["k"].is_number());
        assert!(json["params"]["sigma_obs"].as_f64().unwrap() > 0.0);
        assert_eq!(json["history_end"], "2024-01-30");
    }

    #[test]
    fn test_yearly_seasonality_can_be_disabled() {
        let two_pi = 2.0 * std::f64::consts::PI;
        let data = daily_series(d(2021, 1, 1), 800, |i, _| {
            70.0 + 6.0 * (two_pi * i as f64 / 365.25).sin()
        });
        let mut model = Seer::new()
            .without_yearly_seasonality()
            .without_weekly_seasonality();
        model.fit(&data).unwrap();

        let forecast = model.predict(&data.ds).unwrap();
        assert!(forecast.yearly.iter().all(|&v| v == 0.0));
        assert!(forecast.weekly.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_tight_holiday_prior_shrinks_effect() {
        let holidays = vec![d(2023, 3, 15), d(2023, 6, 14), d(2023, 9, 13), d(2023, 12, 13)];
        let data = daily_series(d(2023, 1, 1), 365, |_, date| {
            if holidays.contains(&date) {
                90.0
            } else {
                80.0
            }
        });
        let effect = |prior_scale: f64| {
            let mut model = Seer::new().without_weekly_seasonality();
            model
                .add_holidays(
                    HolidayConfig::new("events", holidays.clone()).with_prior_scale(prior_scale),
                )
                .unwrap();
            model.fit(&data).unwrap();
            model.predict(&[d(2023, 6, 14)]).unwrap().holidays[0]
        };

        assert!((effect(10.0) - 10.0).abs() < 1.5);
        assert!(effect(1e-4).abs() < 2.0);
        assert!(Seer::new()
            .add_holidays(HolidayConfig::new("bad", holidays.clone()).with_prior_scale(0.0))
            .is_err());
    }

    #[test]
    fn test_optimization_config_caps_iterations() {
        let data = daily_series(d(2024, 1, 1), 90, |i, _| 75.0 + 0.05 * i as f64);
        let mut model = Seer::new().with_optimization_config(OptimizationConfig {
            max_iters: 2,
            ..OptimizationConfig::default()
        });
        model.fit(&data).unwrap();

        let params = model.params().unwrap();
        assert!(params.iterations <= 2);
        assert!(model.predict(&[d(2024, 4, 1)]).unwrap().yhat[0].is_finite());
    }

    #[test]
    fn test_future_dates_out_of_range_is_an_error() {
        let data = daily_series(d(2024, 1, 1), 30, |i, _| 60.0 + i as f64 * 0.2);
        let mut model = Seer::new();
        model.fit(&data).unwrap();

        let err = model.make_future_dates(usize::MAX, true).unwrap_err();
        assert!(matches!(err, crate::SeerError::InvalidInput(_)));
        assert_eq!(model.make_future_dates(3, false).unwrap().len(), 3);
    }
}
