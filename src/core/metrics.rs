use crate::core::data::{ForecastResult, TimeSeriesData};
use serde::Serialize;

/// In-sample accuracy of a forecast against the observed history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub mape: f64,
    /// Number of (observed, predicted) pairs the metrics were computed on.
    pub n: usize,
}

fn check(y_true: &[f64], y_pred: &[f64]) -> crate::Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(crate::SeerError::DataValidation(format!(
            "y_true has {} values but y_pred has {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(crate::SeerError::DataValidation(
            "metrics need at least one value".to_string(),
        ));
    }
    Ok(())
}

fn mean(values: impl Iterator<Item = f64>, n: usize) -> f64 {
    values.sum::<f64>() / n as f64
}

/// mean(|y_true - y_pred|)
pub fn mae(y_true: &[f64], y_pred: &[f64]) -> crate::Result<f64> {
    check(y_true, y_pred)?;
    Ok(mean(
        y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()),
        y_true.len(),
    ))
}

/// mean((y_true - y_pred)^2)
pub fn mse(y_true: &[f64], y_pred: &[f64]) -> crate::Result<f64> {
    check(y_true, y_pred)?;
    Ok(mean(
        y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)),
        y_true.len(),
    ))
}

pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> crate::Result<f64> {
    Ok(mse(y_true, y_pred)?.sqrt())
}

/// mean(|y_true - y_pred| / |y_true|), as a fraction (0.1 is 10%).
pub fn mape(y_true: &[f64], y_pred: &[f64]) -> crate::Result<f64> {
    check(y_true, y_pred)?;
    // same floor on the denominator as scikit-learn
    Ok(mean(
        y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).abs() / t.abs().max(f64::EPSILON)),
        y_true.len(),
    ))
}

impl Metrics {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> crate::Result<Self> {
        let mse = mse(y_true, y_pred)?;
        Ok(Self {
            mae: mae(y_true, y_pred)?,
            mse,
            rmse: mse.sqrt(),
            mape: mape(y_true, y_pred)?,
            n: y_true.len(),
        })
    }
}

/// Pair every observed point with the forecast at the same date and score the
/// pairs. Observations without a forecast row are skipped.
pub fn evaluate(history: &TimeSeriesData, forecast: &ForecastResult) -> crate::Result<Metrics> {
    let (y_true, y_pred): (Vec<f64>, Vec<f64>) = history
        .observations()
        .filter_map(|obs| forecast.lookup(obs.date).map(|p| (obs.value, p.yhat)))
        .unzip();

    if y_true.len() < history.len() {
        tracing::warn!(
            skipped = history.len() - y_true.len(),
            "observations without a matching forecast row"
        );
    }
    Metrics::compute(&y_true, &y_pred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_mape_ten_percent() {
        let v = mape(&[100.0, 200.0], &[110.0, 180.0]).unwrap();
        assert!((v - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_fit_has_zero_error() {
        let y = [1.0, 2.0, 3.0];
        assert_eq!(rmse(&y, &y).unwrap(), 0.0);
        assert_eq!(mae(&y, &y).unwrap(), 0.0);
        assert_eq!(mape(&y, &y).unwrap(), 0.0);
    }

    #[test]
    fn test_known_values() {
        let y_true = [3.0, -0.5, 2.0, 7.0];
        let y_pred = [2.5, 0.0, 2.0, 8.0];
        assert!((mae(&y_true, &y_pred).unwrap() - 0.5).abs() < 1e-12);
        assert!((mse(&y_true, &y_pred).unwrap() - 0.375).abs() < 1e-12);
        assert!((rmse(&y_true, &y_pred).unwrap() - 0.375_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_and_empty() {
        assert!(mae(&[1.0, 2.0], &[1.0]).is_err());
        assert!(mse(&[], &[]).is_err());
        assert!(Metrics::compute(&[], &[]).is_err());
    }

    #[test]
    fn test_evaluate_aligns_by_date() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let history = TimeSeriesData::new(vec![d(1), d(2), d(5)], vec![100.0, 200.0, 50.0]).unwrap();
        let forecast = ForecastResult {
            ds: vec![d(1), d(2), d(3)],
            yhat: vec![110.0, 180.0, 999.0],
            yhat_lower: vec![0.0; 3],
            yhat_upper: vec![0.0; 3],
            trend: vec![0.0; 3],
            yearly: vec![0.0; 3],
            weekly: vec![0.0; 3],
            holidays: vec![0.0; 3],
        };

        let m = evaluate(&history, &forecast).unwrap();

        assert_eq!(m.n, 2);
        assert!((m.mae - 15.0).abs() < 1e-12);
        assert!((m.mse - 250.0).abs() < 1e-12);
        assert!((m.mape - 0.10).abs() < 1e-12);
    }
}
