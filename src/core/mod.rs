pub mod data;
pub mod holidays;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod optimizer; // MAP estimation with argmin L-BFGS
pub mod seasonality;
pub mod trend;

pub use data::{ForecastPoint, ForecastResult, Observation, TimeSeriesData};
pub use holidays::HolidayCalendar;
pub use metrics::Metrics;
pub use model::{HolidayConfig, Seer, TrendType};
