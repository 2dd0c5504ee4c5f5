use chrono::{Days, NaiveDate};

/// Given history dates, return (t values normalized to [0,1], span in days, start date)
pub fn time_scale(history: &[NaiveDate]) -> (Vec<f64>, f64, NaiveDate) {
    let t0 = history.first().copied().unwrap_or_default();
    let t_last = history.last().copied().unwrap_or(t0);
    let span_days = (t_last - t0).num_days() as f64;
    let t = scale_dates(history, t0, span_days);
    (t, span_days.max(1e-12), t0)
}

/// Map dates onto the model time axis fixed by `time_scale`. Dates past the
/// history land above 1.0.
pub fn scale_dates(ds: &[NaiveDate], t0: NaiveDate, span_days: f64) -> Vec<f64> {
    ds.iter()
        .map(|d| {
            let days = (*d - t0).num_days() as f64;
            if span_days > 0.0 { days / span_days } else { 0.0 }
        })
        .collect()
}

/// Days elapsed since `t0`, the axis the Fourier terms are built on.
pub fn days_since(ds: &[NaiveDate], t0: NaiveDate) -> Vec<f64> {
    ds.iter().map(|d| (*d - t0).num_days() as f64).collect()
}

/// Up to `n` changepoints spread evenly over the first `changepoint_range`
/// share of the history, never on the first or last point of that range.
pub fn select_changepoints(t: &[f64], n: usize, changepoint_range: f64) -> Vec<f64> {
    if n == 0 || t.len() <= 2 {
        return Vec::new();
    }
    let last_idx = ((t.len() - 1) as f64 * changepoint_range).floor() as usize;
    if last_idx <= 1 {
        return Vec::new();
    }

    let step = last_idx as f64 / (n + 1) as f64;
    let mut cps: Vec<f64> = (1..=n)
        .map(|i| {
            let idx = (i as f64 * step).round() as usize;
            t[idx.clamp(1, last_idx - 1)]
        })
        .collect();
    cps.sort_by(f64::total_cmp);
    cps.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
    cps
}

/// Build changepoint indicator matrix A (T x S), where A[i,j] = 1 if t[i] >= t_change[j]
pub fn changepoint_matrix(t: &[f64], t_change: &[f64]) -> Vec<Vec<f64>> {
    let s = t_change.len();
    let mut a = vec![vec![0.0; s]; t.len()];
    for (row, &ti) in a.iter_mut().zip(t) {
        for (cell, &tc) in row.iter_mut().zip(t_change) {
            if ti >= tc {
                *cell = 1.0;
            }
        }
    }
    a
}

/// Least-squares line through `(t, y)`, returned as `(slope, intercept)`.
/// A degenerate time axis yields a flat line at the mean.
pub fn ols_linear_trend(t: &[f64], y: &[f64]) -> (f64, f64) {
    if t.is_empty() {
        return (0.0, 0.0);
    }
    let n = t.len() as f64;
    let mean_t = t.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (sxy, sxx) = t
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (&ti, &yi)| {
            let dt = ti - mean_t;
            (sxy + dt * (yi - mean_y), sxx + dt * dt)
        });
    if sxx < 1e-12 {
        return (0.0, mean_y);
    }
    let slope = sxy / sxx;
    (slope, mean_y - slope * mean_t)
}

/// Piecewise-linear trend: slope `k + A·delta`, offset `m - A·(t_change ∘ delta)`.
pub fn piecewise_linear(
    k: f64,
    m: f64,
    delta: &[f64],
    t: &[f64],
    a: &[Vec<f64>],
    t_change: &[f64],
) -> Vec<f64> {
    a.iter()
        .zip(t)
        .map(|(row, &ti)| {
            let (slope, offset) = row
                .iter()
                .zip(delta.iter().zip(t_change))
                .fold((k, m), |(slope, offset), (&on, (&dj, &tc))| {
                    (slope + on * dj, offset - on * tc * dj)
                });
            slope * ti + offset
        })
        .collect()
}

/// Flat trend: constant baseline
pub fn flat_trend(m: f64, n: usize) -> Vec<f64> {
    vec![m; n]
}

/// Standard deviation of the trend at scaled time `t` caused by changepoints
/// that may occur after the history ends.
///
/// Future changepoints arrive at `rate` per unit of scaled time, each one a
/// Laplace(0, `scale`) change in slope. Their accumulated effect at horizon
/// `h = t - 1` has variance `rate * 2 * scale^2 * h^3 / 3`.
pub fn future_trend_sd(t: f64, rate: f64, scale: f64) -> f64 {
    let h = t - 1.0;
    if h <= 0.0 || rate <= 0.0 || scale <= 0.0 {
        return 0.0;
    }
    (rate * 2.0 * scale * scale * h.powi(3) / 3.0).sqrt()
}

/// `periods` consecutive days after `last`. Fails when the last date would
/// fall outside the calendar range chrono can represent.
pub fn future_dates(last: NaiveDate, periods: usize) -> crate::Result<Vec<NaiveDate>> {
    let out_of_range = || {
        crate::SeerError::InvalidInput(format!(
            "a horizon of {} days after {} is out of the supported date range",
            periods, last
        ))
    };
    let periods_u64 = u64::try_from(periods).map_err(|_| out_of_range())?;
    last.checked_add_days(Days::new(periods_u64))
        .ok_or_else(out_of_range)?;

    Ok((1..=periods_u64).map(|i| last + Days::new(i)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_time_scale() {
        let history = vec![d(2020, 1, 1), d(2020, 1, 2), d(2020, 1, 3)];

        let (t, span, t0) = time_scale(&history);

        assert_eq!(t.len(), 3);
        assert_eq!(t[0], 0.0);
        assert_eq!(t[2], 1.0);
        assert!(t[1] > 0.0 && t[1] < 1.0);
        assert_eq!(span, 2.0);
        assert_eq!(t0, d(2020, 1, 1));
    }

    #[test]
    fn test_scale_dates_beyond_history() {
        let t = scale_dates(&[d(2020, 1, 11), d(2020, 1, 21)], d(2020, 1, 1), 10.0);
        assert_eq!(t, vec![1.0, 2.0]);
    }

    #[test]
    fn test_select_changepoints() {
        let t: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let cps = select_changepoints(&t, 5, 0.8);

        assert!(cps.len() <= 5);
        for cp in &cps {
            assert!(*cp >= 0.0 && *cp <= 0.8);
        }
    }

    #[test]
    fn test_select_changepoints_short_history() {
        assert!(select_changepoints(&[0.0, 1.0], 25, 0.8).is_empty());
        assert!(select_changepoints(&[0.0, 0.5, 1.0], 0, 0.8).is_empty());
    }

    #[test]
    fn test_changepoint_matrix() {
        let t = vec![0.0, 0.25, 0.5, 0.75, 1.0];
        let t_change = vec![0.25, 0.75];
        let a = changepoint_matrix(&t, &t_change);

        assert_eq!(a.len(), 5);
        assert_eq!(a[0], vec![0.0, 0.0]);
        assert_eq!(a[1], vec![1.0, 0.0]); // on the first changepoint
        assert_eq!(a[2], vec![1.0, 0.0]);
        assert_eq!(a[3], vec![1.0, 1.0]);
        assert_eq!(a[4], vec![1.0, 1.0]);
    }

    #[test]
    fn test_ols_linear_trend() {
        let t = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let y = vec![10.0, 12.0, 14.0, 16.0, 18.0];

        let (k, m) = ols_linear_trend(&t, &y);

        assert!((k - 2.0).abs() < 1e-10);
        assert!((m - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_piecewise_linear_no_changepoints() {
        let t = vec![0.0, 0.5, 1.0];
        let a = vec![vec![]; 3];

        let trend = piecewise_linear(2.0, 10.0, &[], &t, &a, &[]);

        assert_eq!(trend.len(), 3);
        assert!((trend[0] - 10.0).abs() < 1e-10);
        assert!((trend[1] - 11.0).abs() < 1e-10);
        assert!((trend[2] - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_piecewise_linear_is_continuous_at_changepoint() {
        let t_change = vec![0.5];
        let t = vec![0.5 - 1e-9, 0.5, 1.0];
        let a = changepoint_matrix(&t, &t_change);

        let trend = piecewise_linear(1.0, 0.0, &[2.0], &t, &a, &t_change);

        assert!((trend[0] - trend[1]).abs() < 1e-6);
        // slope after the changepoint is k + delta = 3
        assert!((trend[2] - (0.5 + 3.0 * 0.5)).abs() < 1e-10);
    }

    #[test]
    fn test_flat_trend() {
        let trend = flat_trend(42.0, 5);
        assert_eq!(trend.len(), 5);
        assert!(trend.iter().all(|&x| (x - 42.0).abs() < 1e-10));
    }

    #[test]
    fn test_future_trend_sd_grows_with_horizon() {
        assert_eq!(future_trend_sd(0.7, 25.0, 0.05), 0.0);
        assert_eq!(future_trend_sd(1.0, 25.0, 0.05), 0.0);
        let near = future_trend_sd(1.1, 25.0, 0.05);
        let far = future_trend_sd(1.5, 25.0, 0.05);
        assert!(near > 0.0);
        assert!(far > near);
        assert_eq!(future_trend_sd(1.5, 0.0, 0.05), 0.0);
    }

    #[test]
    fn test_future_dates_daily() {
        let dates = future_dates(d(2020, 1, 31), 3).unwrap();
        assert_eq!(dates, vec![d(2020, 2, 1), d(2020, 2, 2), d(2020, 2, 3)]);
    }

    #[test]
    fn test_future_dates_crosses_leap_day() {
        let dates = future_dates(d(2024, 2, 28), 2).unwrap();
        assert_eq!(dates, vec![d(2024, 2, 29), d(2024, 3, 1)]);
    }

    #[test]
    fn test_future_dates_rejects_unrepresentable_horizon() {
        let err = future_dates(d(2024, 1, 1), usize::MAX).unwrap_err();
        assert!(matches!(err, crate::SeerError::InvalidInput(_)));
        assert!(future_dates(NaiveDate::MAX, 1).is_err());
        assert!(future_dates(NaiveDate::MAX, 0).unwrap().is_empty());
    }
}
