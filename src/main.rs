//! # oilseer
//!
//! Command-line front end: Brent price predictions, full forecasts and model
//! evaluation from an investing.com price export.

use anyhow::Context;
use clap::{Parser, Subcommand};
use oilseer::config::{Config, MAX_HORIZON_DAYS};
use oilseer::core::loader::load_prices;
use oilseer::core::metrics::evaluate;
use oilseer::report::{self, INVALID_DATE_MESSAGE, NO_FORECAST_MESSAGE};
use oilseer::validate::{format_target_date, parse_target_date};
use oilseer::{ForecastService, HolidayCalendar, Seer, TimeSeriesData};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for a malformed target date.
const EXIT_INVALID_DATE: u8 = 2;

#[derive(Parser)]
#[command(name = "oilseer")]
#[command(about = "Brent crude price forecasting", long_about = None)]
struct Cli {
    /// Price history export (overrides OILSEER_CSV_PATH)
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// Forecast horizon in days (overrides OILSEER_HORIZON_DAYS)
    #[arg(long, global = true)]
    horizon: Option<usize>,

    /// Refit on every request instead of reusing fits
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the price for one date
    Predict {
        /// Target date, DD-MM-YYYY
        date: String,
    },

    /// Forecast the history plus the horizon and evaluate the fit
    Forecast {
        /// Write the forecast curve here (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the fitted model parameters here as JSON
        #[arg(long)]
        save_model: Option<PathBuf>,
    },

    /// Optional prediction, full forecast and evaluation in one run
    Dashboard {
        /// Target date, DD-MM-YYYY
        #[arg(short, long)]
        date: Option<String>,

        /// Write the forecast curve here (.csv or .json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the holiday table
    Holidays {
        /// Only this year
        #[arg(short, long)]
        year: Option<i32>,
    },
}

fn build_service(config: &Config) -> anyhow::Result<ForecastService<Seer, impl Fn() -> Seer>> {
    let calendar = Arc::new(HolidayCalendar::united_kingdom(config.holiday_years()));

    // Settings are checked once here; every fit starts from a clone
    let template = Seer::new()
        .with_changepoints(config.n_changepoints)
        .with_changepoint_prior_scale(config.changepoint_prior_scale)?
        .with_interval_width(config.interval_width)?;

    Ok(ForecastService::new(
        move || template.clone(),
        calendar,
        config.service_settings(),
    ))
}

fn load_history(config: &Config) -> anyhow::Result<TimeSeriesData> {
    load_prices(&config.csv_path, &config.csv_format())
        .with_context(|| format!("loading price history from {}", config.csv_path.display()))
}

fn run_prediction<F: Fn() -> Seer>(
    service: &ForecastService<Seer, F>,
    history: &TimeSeriesData,
    raw_date: &str,
) -> anyhow::Result<()> {
    let target = match parse_target_date(raw_date) {
        Ok(date) => date,
        Err(_) => {
            println!("{}", INVALID_DATE_MESSAGE);
            return Ok(());
        }
    };
    let (_, prediction) = service.forecast_at(history, target)?;
    println!("{}", report::prediction_message(target, &prediction));
    Ok(())
}

fn run_forecast<F: Fn() -> Seer>(
    service: &ForecastService<Seer, F>,
    history: &TimeSeriesData,
    output: Option<&Path>,
    save_model: Option<&Path>,
) -> anyhow::Result<()> {
    let fitted = service.forecast_full(history)?;
    let forecast = &fitted.forecast;

    match forecast.point(forecast.len().saturating_sub(1)) {
        Some(last) => println!(
            "Forecast through {}: {:.2} ({:.2} to {:.2})",
            format_target_date(last.ds),
            last.yhat,
            last.yhat_lower,
            last.yhat_upper
        ),
        None => {
            println!("{}", NO_FORECAST_MESSAGE);
            return Ok(());
        }
    }

    let metrics = evaluate(history, forecast)?;
    println!("{}", report::metrics_report(&metrics));

    if let Some(path) = output {
        report::export_forecast(path, forecast)
            .with_context(|| format!("writing forecast to {}", path.display()))?;
        println!("Forecast written to {}", path.display());
    }
    if let Some(path) = save_model {
        std::fs::write(path, fitted.model.to_json()?)
            .with_context(|| format!("writing model to {}", path.display()))?;
        println!("Model written to {}", path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oilseer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(csv) = cli.csv {
        config.csv_path = csv;
    }
    if let Some(horizon) = cli.horizon {
        if horizon > MAX_HORIZON_DAYS {
            anyhow::bail!("--horizon must be at most {} days", MAX_HORIZON_DAYS);
        }
        config.horizon_days = horizon;
    }
    if cli.no_cache {
        config.cache_enabled = false;
    }
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Predict { date } => {
            // Reject malformed input before touching the data file
            if parse_target_date(&date).is_err() {
                println!("{}", INVALID_DATE_MESSAGE);
                return Ok(ExitCode::from(EXIT_INVALID_DATE));
            }
            let service = build_service(&config)?;
            let history = load_history(&config)?;
            run_prediction(&service, &history, &date)?;
        }
        Commands::Forecast { output, save_model } => {
            let service = build_service(&config)?;
            let history = load_history(&config)?;
            run_forecast(&service, &history, output.as_deref(), save_model.as_deref())?;
        }
        Commands::Dashboard { date, output } => {
            let service = build_service(&config)?;
            let history = load_history(&config)?;
            if let Some(date) = date {
                run_prediction(&service, &history, &date)?;
                println!();
            }
            run_forecast(&service, &history, output.as_deref(), None)?;
            tracing::debug!(
                hits = service.cache().hits(),
                misses = service.cache().misses(),
                evictions = service.cache().evictions(),
                "fit cache"
            );
        }
        Commands::Holidays { year } => {
            let calendar = HolidayCalendar::united_kingdom(config.holiday_years());
            print!("{}", report::holiday_listing(&calendar, year));
        }
    }
    Ok(ExitCode::SUCCESS)
}
