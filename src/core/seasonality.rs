use chrono::NaiveDate;
use std::collections::HashSet;
use std::f64::consts::PI;

/// Fourier terms `[sin(2πkt/P), cos(2πkt/P)]` for `k = 1..=order`, one row
/// per entry of `t` (days since the start of the history).
pub fn fourier_series(t: &[f64], period: f64, order: usize) -> Vec<Vec<f64>> {
    t.iter()
        .map(|&day| {
            (1..=order)
                .flat_map(|k| {
                    let angle = 2.0 * PI * k as f64 * day / period;
                    [angle.sin(), angle.cos()]
                })
                .collect()
        })
        .collect()
}

/// Concatenate feature blocks side by side. Blocks without rows are skipped;
/// the rest must share the row count of the first.
pub fn hstack(blocks: &[Vec<Vec<f64>>]) -> Vec<Vec<f64>> {
    let Some(first) = blocks.first() else {
        return Vec::new();
    };
    (0..first.len())
        .map(|i| {
            blocks
                .iter()
                .filter(|block| !block.is_empty())
                .flat_map(|block| block[i].iter().copied())
                .collect()
        })
        .collect()
}

/// Generate holiday indicator features for one named holiday table.
///
/// One column per window offset in `lower_window..=upper_window`: column `j`
/// is 1.0 on every date lying `lower_window + j` days after any holiday.
/// All occurrences share a column, so the fitted effect is per offset rather
/// than per occurrence.
pub fn holiday_features(
    dates: &[NaiveDate],
    holiday_dates: &[NaiveDate],
    lower_window: i32,
    upper_window: i32,
) -> Vec<Vec<f64>> {
    if holiday_dates.is_empty() || upper_window < lower_window {
        return vec![vec![]; dates.len()];
    }

    let holidays: HashSet<NaiveDate> = holiday_dates.iter().copied().collect();
    let offsets: Vec<i32> = (lower_window..=upper_window).collect();

    dates
        .iter()
        .map(|&date| {
            offsets
                .iter()
                .map(|&offset| {
                    // date is `offset` days after the holiday
                    let origin = date - chrono::Duration::days(offset as i64);
                    if holidays.contains(&origin) { 1.0 } else { 0.0 }
                })
                .collect()
        })
        .collect()
}
