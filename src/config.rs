use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::holidays::DEFAULT_YEARS;
use crate::core::loader::CsvFormat;
use crate::service::ServiceSettings;

/// Longest horizon accepted, about a century of daily rows.
pub const MAX_HORIZON_DAYS: usize = 36_525;

/// Runtime configuration, read from `OILSEER_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Price history export.
    pub csv_path: PathBuf,
    pub date_column: String,
    pub price_column: String,
    /// Forecast horizon in calendar days (default: 365).
    pub horizon_days: usize,
    /// First and last year of the holiday table (default: 1970-2025).
    pub holiday_first_year: i32,
    pub holiday_last_year: i32,
    pub interval_width: f64,
    pub n_changepoints: usize,
    pub changepoint_prior_scale: f64,
    /// Reuse fits across requests on the same history.
    pub cache_enabled: bool,
    /// Fits kept in memory at once.
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("brent_historical.csv"),
            date_column: "Data".to_string(),
            price_column: "Último".to_string(),
            horizon_days: 365,
            holiday_first_year: *DEFAULT_YEARS.start(),
            holiday_last_year: *DEFAULT_YEARS.end(),
            interval_width: 0.8,
            n_changepoints: 25,
            changepoint_prior_scale: 0.05,
            cache_enabled: true,
            cache_capacity: crate::service::cache::DEFAULT_CAPACITY,
        }
    }
}

/// Parsed value of `key`, or `default` when unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                tracing::warn!(key, value = %raw, "ignoring unparsable flag");
                default
            }
        },
        Err(_) => default,
    }
}

fn bounded_horizon(days: usize, default: usize) -> usize {
    if days > MAX_HORIZON_DAYS {
        tracing::warn!(
            days,
            max = MAX_HORIZON_DAYS,
            "ignoring horizon beyond the supported maximum"
        );
        default
    } else {
        days
    }
}

impl Config {
    /// Load configuration from environment variables. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            csv_path: env::var("OILSEER_CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.csv_path),
            date_column: env::var("OILSEER_DATE_COLUMN").unwrap_or(defaults.date_column),
            price_column: env::var("OILSEER_PRICE_COLUMN").unwrap_or(defaults.price_column),
            horizon_days: bounded_horizon(
                env_or("OILSEER_HORIZON_DAYS", defaults.horizon_days),
                defaults.horizon_days,
            ),
            holiday_first_year: env_or("OILSEER_HOLIDAY_FIRST_YEAR", defaults.holiday_first_year),
            holiday_last_year: env_or("OILSEER_HOLIDAY_LAST_YEAR", defaults.holiday_last_year),
            interval_width: env_or("OILSEER_INTERVAL_WIDTH", defaults.interval_width),
            n_changepoints: env_or("OILSEER_N_CHANGEPOINTS", defaults.n_changepoints),
            changepoint_prior_scale: env_or(
                "OILSEER_CHANGEPOINT_PRIOR_SCALE",
                defaults.changepoint_prior_scale,
            ),
            cache_enabled: env_flag("OILSEER_CACHE", defaults.cache_enabled),
            cache_capacity: env_or("OILSEER_CACHE_CAPACITY", defaults.cache_capacity),
        }
    }

    pub fn csv_format(&self) -> CsvFormat {
        CsvFormat {
            date_column: self.date_column.clone(),
            price_column: self.price_column.clone(),
            ..CsvFormat::default()
        }
    }

    pub fn holiday_years(&self) -> std::ops::RangeInclusive<i32> {
        self.holiday_first_year..=self.holiday_last_year
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            horizon_days: self.horizon_days,
            cache_enabled: self.cache_enabled,
            cache_capacity: self.cache_capacity,
            model_tag: format!(
                "linear;n_changepoints={};changepoint_prior_scale={};interval_width={}",
                self.n_changepoints, self.changepoint_prior_scale, self.interval_width
            ),
            ..ServiceSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Only this test touches OILSEER_* variables, so it cannot race others.
    #[test]
    fn test_from_env_overrides_and_fallbacks() {
        let defaults = Config::from_env();
        assert_eq!(defaults, Config::default());

        env::set_var("OILSEER_HORIZON_DAYS", "30");
        env::set_var("OILSEER_CACHE", "off");
        env::set_var("OILSEER_INTERVAL_WIDTH", "not-a-number");
        env::set_var("OILSEER_CSV_PATH", "/tmp/prices.csv");
        env::set_var("OILSEER_CACHE_CAPACITY", "3");

        let config = Config::from_env();

        env::remove_var("OILSEER_HORIZON_DAYS");
        env::remove_var("OILSEER_CACHE");
        env::remove_var("OILSEER_INTERVAL_WIDTH");
        env::remove_var("OILSEER_CSV_PATH");
        env::remove_var("OILSEER_CACHE_CAPACITY");

        assert_eq!(config.horizon_days, 30);
        assert_eq!(config.cache_capacity, 3);
        assert_eq!(config.service_settings().cache_capacity, 3);
        assert!(!config.cache_enabled);
        assert_eq!(config.interval_width, 0.8);
        assert_eq!(config.csv_path, PathBuf::from("/tmp/prices.csv"));
    }

    #[test]
    fn test_service_settings_carry_model_tag() {
        let config = Config {
            n_changepoints: 10,
            ..Config::default()
        };
        let settings = config.service_settings();
        assert!(settings.model_tag.contains("n_changepoints=10"));
        assert_eq!(settings.horizon_days, 365);
        assert_eq!((settings.lower_window, settings.upper_window), (0, 1));
        assert_ne!(settings.model_tag, Config::default().service_settings().model_tag);
    }

    #[test]
    fn test_horizon_beyond_maximum_falls_back() {
        assert_eq!(bounded_horizon(730, 365), 730);
        assert_eq!(bounded_horizon(MAX_HORIZON_DAYS, 365), MAX_HORIZON_DAYS);
        assert_eq!(bounded_horizon(usize::MAX, 365), 365);
    }
}
