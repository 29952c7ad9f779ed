use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, ForecastCoordinator, ForecastDay, client_from_config, config::DEFAULT_LOCALE,
};
use inquire::{Password, PasswordDisplayMode, Text};
use serde::Serialize;
use tracing::{debug, warn};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "5-day weather forecast from weatherapi.com")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the weatherapi.com API key and date locale.
    Configure,

    /// Show the 5-day forecast for one or more cities.
    Show {
        /// City names, fetched one after another.
        #[arg(required = true)]
        cities: Vec<String>,

        /// Print one JSON object per city and line instead of a table.
        #[arg(long)]
        json: bool,

        /// Locale for date labels, e.g. "ru_RU"; overrides the config file.
        #[arg(long)]
        locale: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { cities, json, locale } => show(&cities, json, locale.as_deref()).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    // File values only; environment overrides must not end up on disk.
    let mut config = Config::load_from(&Config::config_file_path()?)?;

    let api_key = Password::new("weatherapi.com API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(api_key.trim().to_string());

    let current = config.locale.clone().unwrap_or_else(|| DEFAULT_LOCALE.to_string());
    let locale = Text::new("Date locale:")
        .with_default(&current)
        .prompt()
        .context("Failed to read locale")?;
    config.set_locale(locale.trim())?;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

async fn show(cities: &[String], json: bool, locale: Option<&str>) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(locale) = locale {
        config.override_locale(locale)?;
    }

    let client = client_from_config(&config)?;
    let mut coordinator = ForecastCoordinator::new(client);
    let failures = Arc::new(AtomicUsize::new(0));

    coordinator.on_loading_changed(|loading| debug!(loading, "loading changed"));
    // City notifications precede the forecast of the same completion.
    let current_city = Arc::new(Mutex::new(String::new()));
    let sink = Arc::clone(&current_city);
    coordinator.on_city_updated(move |city| {
        if json {
            if let Ok(mut current) = sink.lock() {
                *current = city.to_string();
            }
        } else {
            println!("{city}");
        }
    });
    coordinator.on_forecast_updated(move |days| {
        if json {
            let city = current_city.lock().map(|c| c.clone()).unwrap_or_default();
            match json_line(&city, days) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "failed to serialize forecast"),
            }
        } else {
            render(days);
        }
    });
    let failed = Arc::clone(&failures);
    coordinator.on_error_occurred(move |message| {
        failed.fetch_add(1, Ordering::Relaxed);
        eprintln!("error: {message}");
    });

    // One at a time, so each city's output stays together.
    let mut requested = 0;
    for city in cities.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        requested += 1;
        coordinator.request_forecast(city);
        coordinator.run_until_idle().await;
    }

    if requested == 0 {
        bail!("No city given");
    }

    let failed = failures.load(Ordering::Relaxed);
    if failed > 0 {
        bail!("{failed} of {requested} forecast requests failed");
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct CityForecast<'a> {
    city: &'a str,
    days: &'a [ForecastDay],
}

/// One compact JSON document per line, so several cities stay machine-readable.
fn json_line(city: &str, days: &[ForecastDay]) -> serde_json::Result<String> {
    serde_json::to_string(&CityForecast { city, days })
}

fn render(days: &[ForecastDay]) {
    for day in days {
        println!("{}", format_row(day));
    }
    println!();
}

fn format_row(day: &ForecastDay) -> String {
    format!(
        "  {:<24} {:<28} {:>6} {:>9} {:>5}",
        day.date, day.condition_text, day.avg_temp, day.max_wind, day.humidity
    )
}
