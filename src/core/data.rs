use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One historical (date, closing price) point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Daily price history, column oriented.
///
/// Dates are strictly ascending with no duplicates and every value is a
/// positive finite number.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesData {
    pub ds: Vec<NaiveDate>,
    pub y: Vec<f64>,
}

impl TimeSeriesData {
    pub fn new(ds: Vec<NaiveDate>, y: Vec<f64>) -> crate::Result<Self> {
        if ds.len() != y.len() {
            return Err(crate::SeerError::DataValidation(
                "ds and y must have same length".to_string(),
            ));
        }

        if let Some(w) = ds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(crate::SeerError::DataValidation(format!(
                "dates must be strictly ascending: {} is followed by {}",
                w[0], w[1]
            )));
        }

        if let Some((date, value)) = ds
            .iter()
            .zip(&y)
            .find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(crate::SeerError::DataValidation(format!(
                "value on {} must be a positive finite number, got {}",
                date, value
            )));
        }

        Ok(Self { ds, y })
    }

    pub fn from_observations(observations: &[Observation]) -> crate::Result<Self> {
        let (ds, y) = observations.iter().map(|o| (o.date, o.value)).unzip();
        Self::new(ds, y)
    }

    pub fn observations(&self) -> impl Iterator<Item = Observation> + '_ {
        self.ds
            .iter()
            .zip(&self.y)
            .map(|(&date, &value)| Observation { date, value })
    }

    pub fn len(&self) -> usize {
        self.ds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ds.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.ds.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.ds.last().copied()
    }
}

/// Model output, one row per requested date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastResult {
    pub ds: Vec<NaiveDate>,
    pub yhat: Vec<f64>,
    pub yhat_lower: Vec<f64>,
    pub yhat_upper: Vec<f64>,
    pub trend: Vec<f64>,
    pub yearly: Vec<f64>,
    pub weekly: Vec<f64>,
    pub holidays: Vec<f64>,
}

/// A single row of a [`ForecastResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub trend: f64,
    pub yearly: f64,
    pub weekly: f64,
    pub holidays: f64,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.ds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ds.is_empty()
    }

    pub fn point(&self, i: usize) -> Option<ForecastPoint> {
        if i >= self.ds.len() {
            return None;
        }
        Some(ForecastPoint {
            ds: self.ds[i],
            yhat: self.yhat[i],
            yhat_lower: self.yhat_lower[i],
            yhat_upper: self.yhat_upper[i],
            trend: self.trend[i],
            yearly: self.yearly[i],
            weekly: self.weekly[i],
            holidays: self.holidays[i],
        })
    }

    pub fn points(&self) -> impl Iterator<Item = ForecastPoint> + '_ {
        (0..self.ds.len()).filter_map(|i| self.point(i))
    }

    /// Row whose date equals `date` exactly. Dates are ascending, so this is a
    /// binary search.
    pub fn lookup(&self, date: NaiveDate) -> Option<ForecastPoint> {
        self.ds
            .binary_search(&date)
            .ok()
            .and_then(|i| self.point(i))
    }
}
