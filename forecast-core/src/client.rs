use crate::{Config, ForecastDay, ForecastError, client::weatherapi::WeatherApiClient};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod weatherapi;

/// A source of multi-day forecasts. One call, one request, no retries.
#[async_trait]
pub trait ForecastClient: Send + Sync + Debug {
    async fn fetch(&self, city: &str) -> Result<Vec<ForecastDay>, ForecastError>;
}

/// Construct the weatherapi.com client from config.
pub fn client_from_config(config: &Config) -> anyhow::Result<Arc<dyn ForecastClient>> {
    let client = WeatherApiClient::new(config.api_key()?.to_owned())
        .with_base_url(config.base_url())
        .with_locale(config.locale()?);

    Ok(Arc::new(client))
}
