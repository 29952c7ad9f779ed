//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - A weatherapi.com client that fetches a 5-day forecast for a city
//! - The mapping from the API schema to display-ready forecast days
//! - A coordinator that tracks loading state and notifies subscribers
//! - Configuration & credentials handling
//!
//! It is used by `forecast-cli`, but any front end can drive the
//! [`ForecastCoordinator`] the same way.

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod mapper;
pub mod model;

pub use client::{ForecastClient, client_from_config, weatherapi::WeatherApiClient};
pub use config::Config;
pub use coordinator::{ForecastCoordinator, SubscriptionId};
pub use error::ForecastError;
pub use model::{ForecastDay, RawForecastResponse};
